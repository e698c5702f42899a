use std::sync::Arc;

use axum::{
    extract::{
        multipart::MultipartRejection, rejection::FormRejection, Multipart, Path, Query, State,
    },
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Form, Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::{pages, AppState, ApiError};
use crate::qr;
use crate::query::{filter_by_session, group_by_session, SessionGroup};
use crate::record::{AttendanceRecord, SessionKey};
use crate::submission::{SubmissionError, SubmissionForm, SUCCESS_MESSAGE};

/// Response of a newly opened session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionView {
    /// The session.
    #[serde(flatten)]
    pub session: SessionKey,
    /// Link to the submission form; the QR payload.
    pub form_url: String,
    /// QR code of `form_url` as an SVG document.
    pub qr_svg: String,
    /// Records already submitted for the session.
    pub records: Vec<AttendanceRecord>,
}

/// JSON body of the data-mode submission endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponse {
    /// Whether the record was stored.
    pub success: bool,
    /// Confirmation message on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Failure message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Machine-readable failure reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl SubmitResponse {
    /// A success body.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error: None,
            reason: None,
        }
    }

    /// A failure body.
    #[must_use]
    pub fn failure(error: impl Into<String>, reason: Option<&str>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
            reason: reason.map(str::to_string),
        }
    }
}

/// Query of the form page; every part may be missing.
#[derive(Debug, Default, Deserialize)]
pub(super) struct FormQuery {
    lecture_name: Option<String>,
    date: Option<String>,
    time: Option<String>,
}

fn status_for(err: &SubmissionError) -> StatusCode {
    if err.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

async fn load_records(state: &Arc<AppState>) -> Result<Vec<AttendanceRecord>, ApiError> {
    let store = state.handler().store().clone();
    Ok(tokio::task::spawn_blocking(move || store.load()).await?)
}

/// Read every field of a multipart body into `form`.
///
/// Fields read before a decoding failure stay in `form`.
async fn read_form(
    multipart: Result<Multipart, MultipartRejection>,
    form: &mut SubmissionForm,
) -> Result<(), SubmissionError> {
    let malformed = |err: &dyn std::fmt::Display| SubmissionError::MalformedUpload(err.to_string());

    let mut multipart = multipart.map_err(|err| malformed(&err))?;

    while let Some(field) = multipart.next_field().await.map_err(|err| malformed(&err))? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == "photo" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let bytes = field.bytes().await.map_err(|err| malformed(&err))?;
            form.set_photo(file_name, bytes.to_vec());
        } else {
            let value = field.text().await.map_err(|err| malformed(&err))?;
            form.set_field(&name, value);
        }
    }

    Ok(())
}

/// Validate and store a submission on the blocking pool.
async fn run_submission(
    state: &Arc<AppState>,
    form: SubmissionForm,
) -> Result<AttendanceRecord, SubmissionError> {
    let submission = form.into_submission()?;
    let handler = state.handler().clone();

    match tokio::task::spawn_blocking(move || handler.submit(submission)).await {
        Ok(result) => result,
        Err(err) => {
            error!("Submission task failed: {err}");
            Err(SubmissionError::Internal(err.to_string()))
        }
    }
}

/// `GET /`: the organizer's form for opening a session.
pub(super) async fn session_form() -> Html<String> {
    Html(pages::session_form())
}

/// `POST /`: open a session and list what was already submitted for it.
pub(super) async fn open_session(
    State(state): State<Arc<AppState>>,
    form: Result<Form<SessionKey>, FormRejection>,
) -> Result<Json<SessionView>, ApiError> {
    let Form(session) = form.map_err(|err| ApiError::BadRequest(err.body_text()))?;
    let form_url = state.form_url(&session)?;
    let qr_svg = qr::svg(&form_url)?;
    let records = filter_by_session(&load_records(&state).await?, &session);

    info!("Opened session {session} with {} record(s)", records.len());
    Ok(Json(SessionView {
        session,
        form_url,
        qr_svg,
        records,
    }))
}

/// `GET /attendance-form`: the submission form.
pub(super) async fn attendance_form(Query(query): Query<FormQuery>) -> Html<String> {
    let session = SessionKey::new(
        query.lecture_name.unwrap_or_default(),
        query.date.unwrap_or_default(),
        query.time.unwrap_or_default(),
    );
    Html(pages::attendance_form(&session, None))
}

/// `POST /attendance-form`: submit and redisplay the form with the outcome.
pub(super) async fn submit_form(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let mut form = SubmissionForm::new();
    let read = read_form(multipart, &mut form).await;
    let session = form.session_hint();
    let result = match read {
        Ok(()) => run_submission(&state, form).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(_) => {
            let notice = pages::Notice::success(SUCCESS_MESSAGE);
            Html(pages::attendance_form(&session, Some(&notice))).into_response()
        }
        Err(err) => {
            warn!("Submission failed ({}): {err}", err.reason());
            let notice = pages::Notice::error(err.to_string());
            let page = pages::attendance_form(&session, Some(&notice));
            (status_for(&err), Html(page)).into_response()
        }
    }
}

/// `POST /submit-attendance`: submit and answer with JSON.
pub(super) async fn submit_json(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> (StatusCode, Json<SubmitResponse>) {
    let mut form = SubmissionForm::new();
    let read = read_form(multipart, &mut form).await;
    let result = match read {
        Ok(()) => run_submission(&state, form).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(_) => (StatusCode::OK, Json(SubmitResponse::success(SUCCESS_MESSAGE))),
        Err(err) => {
            warn!("Submission failed ({}): {err}", err.reason());
            (
                status_for(&err),
                Json(SubmitResponse::failure(err.to_string(), Some(err.reason()))),
            )
        }
    }
}

/// `GET /admin`: every session with its records.
pub(super) async fn admin(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<SessionGroup>>, ApiError> {
    let records = load_records(&state).await?;
    Ok(Json(group_by_session(&records)))
}

/// `GET /show-attendance/{lecture_name}/{date}/{time}`: one session.
pub(super) async fn show_attendance(
    State(state): State<Arc<AppState>>,
    Path((lecture_name, date, time)): Path<(String, String, String)>,
) -> Result<Json<Vec<AttendanceRecord>>, ApiError> {
    let session = SessionKey::new(lecture_name, date, time);
    let records = load_records(&state).await?;
    Ok(Json(filter_by_session(&records, &session)))
}
