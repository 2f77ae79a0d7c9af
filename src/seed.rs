// ABOUTME: Demo data seeding for development and demos
// ABOUTME: Populates schools, users, students, and sample analyses when the stores are empty
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Growth Engine

//! Demo data seeding.
//!
//! Runs only against empty stores, so restarting a long-lived process (or
//! calling it twice) never duplicates records.

use tracing::info;

use crate::constants::limits;
use crate::errors::AppError;
use crate::llm::ChatMessage;
use crate::models::{User, UserRole};
use crate::resources::ServerResources;
use crate::store::NewAnalysis;

/// Demo teacher login email
pub const DEMO_TEACHER_EMAIL: &str = "teacher@example.com";
/// Demo admin login email
pub const DEMO_ADMIN_EMAIL: &str = "admin@tlv-hs.edu";
/// Shared demo password
pub const DEMO_PASSWORD: &str = "Test123!";

/// Seed demo data into empty stores.
///
/// # Errors
///
/// Returns an error if password hashing or a store insert fails.
pub fn seed_demo_data(resources: &ServerResources) -> Result<(), AppError> {
    seed_schools(resources)?;
    seed_users(resources)?;
    seed_students(resources);
    seed_analyses(resources);
    Ok(())
}

fn seed_schools(resources: &ServerResources) -> Result<(), AppError> {
    if !resources.schools.is_empty() {
        return Ok(());
    }

    let school = resources.schools.create(
        "TLV-HS-01".into(),
        "Tel Aviv High School".into(),
        Some("Tel Aviv, Israel".into()),
    )?;
    info!(school = %school.name, "Seeded demo school");
    Ok(())
}

fn seed_users(resources: &ServerResources) -> Result<(), AppError> {
    if !resources.users.is_empty() {
        return Ok(());
    }

    let school_id = resources.schools.get_by_code("TLV-HS-01").map(|s| s.id);
    let password_hash = bcrypt::hash(DEMO_PASSWORD, limits::BCRYPT_COST)
        .map_err(|e| AppError::internal(format!("Failed to hash demo password: {e}")))?;

    resources.users.create(User::new(
        DEMO_TEACHER_EMAIL.into(),
        password_hash.clone(),
        "Demo".into(),
        "Teacher".into(),
        school_id.clone(),
    ))?;

    resources.users.create(
        User::new(
            "principal@tlv-hs.edu".into(),
            password_hash.clone(),
            "Jane".into(),
            "Smith".into(),
            school_id.clone(),
        )
        .with_role(UserRole::Principal),
    )?;

    resources.users.create(
        User::new(
            DEMO_ADMIN_EMAIL.into(),
            password_hash,
            "Admin".into(),
            "User".into(),
            school_id,
        )
        .with_role(UserRole::Admin),
    )?;

    info!("Seeded demo users (teacher, principal, admin)");
    Ok(())
}

fn seed_students(resources: &ServerResources) {
    if !resources.students.is_empty() {
        return;
    }

    for (name, grade, class) in [
        ("שרה כהן", "כיתה ג׳", "גב׳ לוי"),
        ("מיכאל דוד", "כיתה ג׳", "גב׳ לוי"),
        ("נועה אברהם", "כיתה ד׳", "מר רוזנברג"),
        ("דניאל יוסף", "כיתה ה׳", "גב׳ שפירא"),
        ("תמר לוי", "כיתה ד׳", "מר רוזנברג"),
    ] {
        resources
            .students
            .create(name.into(), grade.into(), Some(class.into()));
    }
    info!(count = resources.students.len(), "Seeded demo students");
}

fn seed_analyses(resources: &ServerResources) {
    if !resources.analyses.is_empty() {
        return;
    }

    resources.analyses.create(NewAnalysis {
        student_id: "1".into(),
        analysis: SARAH_ANALYSIS.into(),
        conversation_history: Some(vec![
            ChatMessage::assistant("שלום! בוא נדבר על שרה. מה אתה יכול לספר לי עליה?"),
            ChatMessage::user("שרה היא תלמידה מקסימה עם כישורים חברתיים מעולים"),
            ChatMessage::assistant("נהדר! מה לגבי הלמידה? באילו תחומים היא מצטיינת?"),
            ChatMessage::user("היא מאוד יצירתית ומוטיבציה, אבל יש לה קושי בריכוז ובמתמטיקה"),
        ]),
        created_by: "1".into(),
    });

    resources.analyses.create(NewAnalysis {
        student_id: "2".into(),
        analysis: MICHAEL_ANALYSIS.into(),
        conversation_history: None,
        created_by: "1".into(),
    });

    info!(count = resources.analyses.len(), "Seeded demo analyses");
}

const SARAH_ANALYSIS: &str = r"# ניתוח תלמידה: שרה כהן

## נקודות חוזק

- **כישורים חברתיים מצוינים**: שרה מפגינה יכולת יוצאת דופן ליצור קשרים עם חבריה לכיתה
- **מוטיבציה גבוהה**: מגלה עניין רב בלמידה ושואפת להצטיין
- **יצירתיות**: מביאה רעיונות מקוריים ופתרונות יצירתיים לבעיות

## תחומים לשיפור

- **קושי בריכוז**: מתקשה להישאר ממוקדת במשימות ארוכות טווח
- **ארגון**: צריכה סיוע בארגון החומרים והמטלות
- **מתמטיקה**: זקוקה לתמיכה נוספת בפתרון בעיות מילוליות

## המלצות להתערבות

1. **ליווי אישי בשיעורי מתמטיקה**: מפגשי העשרה קצרים פעמיים בשבוע
2. **כלי ארגון**: הכנסת מחברת מעקב ומערכת צבעים לסימון משימות
3. **הפסקות מתוזמנות**: אפשרות להפסקות קצרות במהלך משימות ארוכות
4. **חיזוק חיובי**: הכרה והערכה של ההתקדמות והמאמץ

## צעדים הבאים

- [ ] פגישה עם ההורים לתיאום תכנית התערבות
- [ ] תיאום מפגשי העשרה במתמטיקה
- [ ] מעקב שבועי אחר התקדמות
- [ ] הערכה מחדש בעוד חודש";

const MICHAEL_ANALYSIS: &str = r"# ניתוח תלמיד: מיכאל דוד

## נקודות חוזק

- **מתמטיקה מצוינת**: מפגין הבנה מעמיקה של מושגים מתמטיים
- **עצמאות**: מסוגל לעבוד באופן עצמאי ולפתור בעיות לבד
- **אחריות**: אחראי ומסודר, מגיש מטלות בזמן

## תחומים לשיפור

- **ביטחון עצמי**: נוטה להטיל ספק ביכולותיו למרות הצלחותיו
- **עבודה בצוות**: מתקשה לפעמים לעבוד עם אחרים
- **ביטוי בכתב**: צריך חיזוק בכתיבה יצירתית והבעה עצמית

## המלצות להתערבות

1. **תגבור חיובי**: הדגשת הצלחות והישגים לחיזוק הביטחון
2. **פעילויות קבוצתיות**: שילוב מתוכנן בעבודות צוות קטנות
3. **סדנאות כתיבה**: השתתפות בחוג כתיבה יצירתית
4. **תפקידי מנהיגות**: הזדמנויות להוביל פרויקטים קטנים

## צעדים הבאים

- [ ] שיחה אישית לחיזוק הביטחון העצמי
- [ ] שיבוץ בקבוצת לימוד מתאימה
- [ ] רישום לחוג כתיבה
- [ ] מעקב חודשי אחר התקדמות";
