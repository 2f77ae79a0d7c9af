// ABOUTME: System prompt loading and the canned Hebrew question sequence
// ABOUTME: Provides the guided-interview prompts and the template fallback replies
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Growth Engine

//! Prompt loading and template fallback.
//!
//! The system prompt can be read from a file configured via
//! `SYSTEM_PROMPT_PATH`; otherwise a built-in default is used. The template
//! bank is the deterministic Hebrew question sequence served when no LLM is
//! configured (or its credentials turn out to be invalid mid-conversation).

use std::path::Path;
use tracing::warn;

/// Placeholder replaced with the student's display name in prompts and
/// template questions
const STUDENT_NAME_PLACEHOLDER: &str = "{studentName}";

/// Canned Hebrew follow-up questions, served by index when the LLM gateway
/// is unavailable. The initial question lives in [`first_question`].
const QUESTION_TEMPLATES: [&str; 5] = [
    "תודה! זה מאוד מועיל.\n\n**שאלה 2 מתוך 6:**\nכיצד {studentName} בדרך כלל מתקשר/ת עם השיעורים? האם הוא/היא לומד/ת בצורה ויזואלית, שמיעתית, או קינסטטית יותר? תאר/י את ההשתתפות שלו/שלה בדיונים בכיתה ובפעילויות קבוצתיות.",
    "מעולה, תובנות חשובות.\n\n**שאלה 3 מתוך 6:**\nספר/י לי על הרגלי השיעורים הביתיים וההתנהגות של {studentName}. האם הוא/היא משלים/ה משימות בזמן? כיצד היית מתאר/ת את ההתנהגות שלו/שלה בכיתה - ממוקד/ת, מתוסכל/ת בקלות, או משהו באמצע?",
    "תודה על המידע.\n\n**שאלה 4 מתוך 6:**\nכיצד {studentName} מתקשר/ת עם חברי הכיתה? האם הוא/היא עובד/ת היטב בקבוצות? האם שמת/ת לב לדפוסים רגשיים או התנהגותיים שמשפיעים על הלמידה שלו/שלה?",
    "מצוין, זה מאוד עוזר.\n\n**שאלה 5 מתוך 6:**\nמה האתגרים העיקריים שעומדים בפני {studentName} בלמידה? האם שמת/ת לב לשיפורים או שינויים לאחרונה בביצועיו/ביצועיה?",
    "תובנות נהדרות, כמעט סיימנו!\n\n**שאלה 6 מתוך 6:**\nאילו חוזקות או כישרונות ייחודיים שמת/ת לב אצל {studentName}? האם יש עוד משהו חשוב עליו/עליה שיכול לעזור ביצירת תוכנית למידה מותאמת אישית?",
];

/// Build the hand-authored first question that opens every conversation
#[must_use]
pub fn first_question(student_name: &str) -> String {
    format!(
        "שלום! בואו ננתח את {student_name}. כדי ליצור ניתוח מקיף, אשאל אותך מספר שאלות על התלמיד/ה.\n\n**שאלה 1 מתוך 6:**\nכיצד היית מתאר/ת את הביצועים האקדמיים הכוללים של {student_name} במקצועות השונים? באילו מקצועות הוא/היא מצטיין/ת, ובאילו מקצועות יש קשיים?"
    )
}

/// Closing message inviting the teacher to finalize, served once the
/// template bank is exhausted
#[must_use]
pub fn closing_message(student_name: &str) -> String {
    format!(
        "תודה רבה על כל המידע המפורט! יש לי תמונה ברורה של {student_name}.\n\nלחץ/י על כפתור \"השלם ניתוח\" כדי לקבל ניתוח מקיף עם המלצות ספציפיות לתלמיד/ה."
    )
}

/// Template fallback reply for the given assistant-turn count.
///
/// `question_count` indexes the canned question bank (0-based); once the
/// bank is exhausted the closing message is returned. Pure string selection,
/// no state.
#[must_use]
pub fn template_reply(question_count: u32, student_name: &str) -> String {
    QUESTION_TEMPLATES
        .get(question_count as usize)
        .map_or_else(
            || closing_message(student_name),
            |template| template.replace(STUDENT_NAME_PLACEHOLDER, student_name),
        )
}

/// Default system prompt used when no prompt file is configured or readable
#[must_use]
pub fn default_system_prompt(student_name: &str) -> String {
    format!(
        r"You are an expert educational psychologist for K-12 students. Your role is to help teachers analyze individual student learning profiles.

PROCESS:
1. When given a student name, ask 6 key questions one at a time:
   - Overall academic performance and subject strengths/weaknesses
   - Learning style and class engagement
   - Homework habits and behavior
   - Social interactions and emotional patterns
   - Main learning challenges and recent progress
   - Unique strengths and additional observations

2. After gathering responses, provide a comprehensive Hebrew analysis with:
   - Summary (2-3 sentences)
   - Strengths (academic + behavioral/social)
   - Areas for improvement (academic + behavioral/emotional)
   - Action plan (immediate + long-term recommendations)
   - Classroom adaptations (seating, teaching style, materials)
   - Success metrics and follow-up timeline

FORMAT: Use clear Hebrew headers with emojis, bullet points, and specific actionable steps.

TONE: Empathetic, strengths-first, growth-oriented, evidence-based. Focus on what the student CAN do and how to build from there.

OUTPUT LANGUAGE: Hebrew only

CURRENT STUDENT: {student_name}"
    )
}

/// Load the system prompt for a student.
///
/// Reads the configured prompt file, substitutes `{studentName}`, and
/// appends a `CURRENT STUDENT:` line when the name is not already present.
/// Falls back to [`default_system_prompt`] when no path is configured or the
/// file cannot be read.
#[must_use]
pub fn load_system_prompt(path: Option<&Path>, student_name: &str) -> String {
    let Some(path) = path else {
        return default_system_prompt(student_name);
    };

    match std::fs::read_to_string(path) {
        Ok(raw) => {
            let mut prompt = raw.replace(STUDENT_NAME_PLACEHOLDER, student_name);
            if !prompt.contains(student_name) {
                prompt.push_str(&format!("\n\nCURRENT STUDENT: {student_name}"));
            }
            prompt
        }
        Err(e) => {
            warn!(
                "Failed to load system prompt from {}, using default: {e}",
                path.display()
            );
            default_system_prompt(student_name)
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_first_question_mentions_student_and_count() {
        let question = first_question("Dana");
        assert!(question.contains("Dana"));
        assert!(question.contains("שאלה 1 מתוך 6"));
    }

    #[test]
    fn test_template_reply_substitutes_name() {
        for index in 0..5 {
            let reply = template_reply(index, "נועה");
            assert!(reply.contains("נועה"), "index {index} missing name");
            assert!(!reply.contains(STUDENT_NAME_PLACEHOLDER));
        }
    }

    #[test]
    fn test_template_reply_exhausted_returns_closing() {
        let reply = template_reply(5, "Dana");
        assert!(reply.contains("השלם ניתוח"));
        let reply = template_reply(42, "Dana");
        assert!(reply.contains("השלם ניתוח"));
    }

    #[test]
    fn test_template_sequence_numbers() {
        assert!(template_reply(0, "x").contains("שאלה 2 מתוך 6"));
        assert!(template_reply(4, "x").contains("שאלה 6 מתוך 6"));
    }

    #[test]
    fn test_default_prompt_names_student() {
        let prompt = default_system_prompt("Michael");
        assert!(prompt.contains("CURRENT STUDENT: Michael"));
    }

    #[test]
    fn test_load_system_prompt_missing_file_falls_back() {
        let prompt =
            load_system_prompt(Some(Path::new("/nonexistent/prompt.txt")), "Dana");
        assert!(prompt.contains("CURRENT STUDENT: Dana"));
    }

    #[test]
    fn test_load_system_prompt_none_path_uses_default() {
        let prompt = load_system_prompt(None, "Dana");
        assert_eq!(prompt, default_system_prompt("Dana"));
    }
}
