// ABOUTME: Student CRUD route handlers
// ABOUTME: Authenticated create, list, read, update, and delete for students
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Growth Engine

//! Student routes.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::errors::AppError;
use crate::models::Student;
use crate::resources::ServerResources;
use crate::store::students::StudentUpdate;

/// Request to create a student
#[derive(Debug, Deserialize)]
pub struct CreateStudentRequest {
    /// Display name
    pub name: String,
    /// Grade label
    pub grade: String,
    /// Optional class label
    #[serde(default)]
    pub class: Option<String>,
}

/// Request to partially update a student
#[derive(Debug, Deserialize, Default)]
pub struct UpdateStudentRequest {
    /// New display name
    #[serde(default)]
    pub name: Option<String>,
    /// New grade label
    #[serde(default)]
    pub grade: Option<String>,
    /// New class label
    #[serde(default)]
    pub class: Option<String>,
}

/// Single-student response
#[derive(Debug, Serialize, Deserialize)]
pub struct StudentResponse {
    /// The student record
    pub student: Student,
}

/// Student list response
#[derive(Debug, Serialize, Deserialize)]
pub struct StudentListResponse {
    /// All students
    pub students: Vec<Student>,
    /// Total count
    pub total: usize,
}

/// Student routes handler
pub struct StudentRoutes;

impl StudentRoutes {
    /// Create all student routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/students",
                get(Self::list_students).post(Self::create_student),
            )
            .route(
                "/api/students/:id",
                get(Self::get_student)
                    .put(Self::update_student)
                    .delete(Self::delete_student),
            )
            .with_state(resources)
    }

    async fn list_students(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        super::authenticate(&headers, &resources)?;

        let students = resources.students.get_all();
        let total = students.len();
        Ok((
            StatusCode::OK,
            Json(StudentListResponse { students, total }),
        )
            .into_response())
    }

    async fn create_student(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<CreateStudentRequest>,
    ) -> Result<Response, AppError> {
        super::authenticate(&headers, &resources)?;

        let name = request.name.trim();
        if name.is_empty() {
            return Err(AppError::invalid_input("Student name required"));
        }

        let student = resources
            .students
            .create(name.to_owned(), request.grade, request.class);
        Ok((StatusCode::CREATED, Json(StudentResponse { student })).into_response())
    }

    async fn get_student(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        super::authenticate(&headers, &resources)?;

        let student = resources
            .students
            .get_by_id(&id)
            .ok_or_else(|| AppError::not_found("Student"))?;
        Ok((StatusCode::OK, Json(StudentResponse { student })).into_response())
    }

    async fn update_student(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
        Json(request): Json<UpdateStudentRequest>,
    ) -> Result<Response, AppError> {
        super::authenticate(&headers, &resources)?;

        let student = resources
            .students
            .update(
                &id,
                StudentUpdate {
                    name: request.name,
                    grade: request.grade,
                    class: request.class,
                },
            )
            .ok_or_else(|| AppError::not_found("Student"))?;
        Ok((StatusCode::OK, Json(StudentResponse { student })).into_response())
    }

    async fn delete_student(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        super::authenticate(&headers, &resources)?;

        if !resources.students.delete(&id) {
            return Err(AppError::not_found("Student"));
        }
        Ok((StatusCode::NO_CONTENT, ()).into_response())
    }
}
