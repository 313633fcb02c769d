//! HTTP gateways for the reintegration backend. One [`ApiClient`] per
//! deployment base URL; every method is a single request with no retry,
//! no caching, and no local mutation. Authenticated calls borrow a
//! [`Session`] and attach its bearer token; the two anonymous calls
//! (login, user creation) do not.

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use shared::{
    domain::{
        Enrollment, EnrollmentId, Profile, Program, ProgramId, ProgramKind, User, UserId,
    },
    protocol::{
        ApiEnvelope, AuthenticatedUser, CreatedData, EnrollmentListData, EnrollmentUpdate,
        LoginData, LoginRequest, NewEnrollment, NewProfile, NewProgram, NewUser, ProfileData,
        ProgramListData, UserListData, UserUpdate,
    },
};
use thiserror::Error;
use tracing::debug;

pub mod session;

pub use session::{Session, SessionService};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server error {status}: {message}")]
    Api { status: u16, message: String },
    #[error("malformed server response: {0}")]
    Envelope(String),
}

pub type GatewayResult<T> = Result<T, GatewayError>;

pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authorized(&self, builder: RequestBuilder, session: &Session) -> RequestBuilder {
        builder.bearer_auth(session.token())
    }

    // ---- auth ----

    /// `POST /usuarios/login` — anonymous; exchanges credentials for the
    /// authenticated principal (user + bearer token).
    pub async fn login(&self, email: &str, password: &str) -> GatewayResult<AuthenticatedUser> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let envelope: ApiEnvelope<LoginData> = self
            .send(self.http.post(self.url("/usuarios/login")).json(&request))
            .await?;
        Ok(require_data(envelope)?.user)
    }

    // ---- users ----

    /// `GET /usuarios/list`
    pub async fn list_users(&self, session: &Session) -> GatewayResult<Vec<User>> {
        let envelope: ApiEnvelope<UserListData> = self
            .send(self.authorized(self.http.get(self.url("/usuarios/list")), session))
            .await?;
        Ok(require_data(envelope)?.usuarios)
    }

    /// `POST /usuarios/insert` — intentionally anonymous: user creation is
    /// the one mutation the backend accepts without a bearer token.
    pub async fn create_user(&self, new_user: &NewUser) -> GatewayResult<()> {
        let envelope: ApiEnvelope<serde_json::Value> = self
            .send(self.http.post(self.url("/usuarios/insert")).json(new_user))
            .await?;
        require_success(envelope).map(|_| ())
    }

    /// `PUT /usuarios/update/{id}`
    pub async fn update_user(
        &self,
        session: &Session,
        id: &UserId,
        update: &UserUpdate,
    ) -> GatewayResult<()> {
        let url = self.url(&format!("/usuarios/update/{id}"));
        let envelope: ApiEnvelope<serde_json::Value> = self
            .send(self.authorized(self.http.put(url), session).json(update))
            .await?;
        require_success(envelope).map(|_| ())
    }

    // ---- profiles ----

    /// `POST /perfil/crear`
    pub async fn create_profile(
        &self,
        session: &Session,
        profile: &NewProfile,
    ) -> GatewayResult<()> {
        let envelope: ApiEnvelope<serde_json::Value> = self
            .send(
                self.authorized(self.http.post(self.url("/perfil/crear")), session)
                    .json(profile),
            )
            .await?;
        require_success(envelope).map(|_| ())
    }

    /// `GET /perfil/usuario/{usuarioId}`
    pub async fn profile_for_user(
        &self,
        session: &Session,
        usuario_id: &UserId,
    ) -> GatewayResult<Profile> {
        let url = self.url(&format!("/perfil/usuario/{usuario_id}"));
        let envelope: ApiEnvelope<ProfileData> =
            self.send(self.authorized(self.http.get(url), session)).await?;
        Ok(require_data(envelope)?.perfil)
    }

    // ---- programs ----

    /// `GET /programas/listar` — a missing `programas` key means an empty
    /// listing, not an error.
    pub async fn list_programs(&self, session: &Session) -> GatewayResult<Vec<Program>> {
        let envelope: ApiEnvelope<ProgramListData> = self
            .send(self.authorized(self.http.get(self.url("/programas/listar")), session))
            .await?;
        Ok(require_success(envelope)?
            .map(|d| d.programas)
            .unwrap_or_default())
    }

    /// `GET /programas/tipo/{tipo}`
    pub async fn programs_by_kind(
        &self,
        session: &Session,
        kind: ProgramKind,
    ) -> GatewayResult<Vec<Program>> {
        let url = self.url(&format!("/programas/tipo/{}", kind.wire_name()));
        let envelope: ApiEnvelope<ProgramListData> =
            self.send(self.authorized(self.http.get(url), session)).await?;
        Ok(require_success(envelope)?
            .map(|d| d.programas)
            .unwrap_or_default())
    }

    /// `POST /programas/crear`
    pub async fn create_program(
        &self,
        session: &Session,
        program: &NewProgram,
    ) -> GatewayResult<()> {
        let envelope: ApiEnvelope<serde_json::Value> = self
            .send(
                self.authorized(self.http.post(self.url("/programas/crear")), session)
                    .json(program),
            )
            .await?;
        require_success(envelope).map(|_| ())
    }

    /// `PUT /programas/actualizar/{id}`
    pub async fn update_program(
        &self,
        session: &Session,
        id: &ProgramId,
        program: &NewProgram,
    ) -> GatewayResult<()> {
        let url = self.url(&format!("/programas/actualizar/{id}"));
        let envelope: ApiEnvelope<serde_json::Value> = self
            .send(self.authorized(self.http.put(url), session).json(program))
            .await?;
        require_success(envelope).map(|_| ())
    }

    /// `DELETE /programas/eliminar/{id}`
    pub async fn delete_program(&self, session: &Session, id: &ProgramId) -> GatewayResult<()> {
        let url = self.url(&format!("/programas/eliminar/{id}"));
        let envelope: ApiEnvelope<serde_json::Value> =
            self.send(self.authorized(self.http.delete(url), session)).await?;
        require_success(envelope).map(|_| ())
    }

    // ---- enrollments ----

    /// `GET /inscripciones/todas`
    pub async fn list_enrollments(&self, session: &Session) -> GatewayResult<Vec<Enrollment>> {
        let envelope: ApiEnvelope<EnrollmentListData> = self
            .send(self.authorized(self.http.get(self.url("/inscripciones/todas")), session))
            .await?;
        Ok(require_data(envelope)?.inscripciones)
    }

    /// `GET /inscripciones/usuario/{usuarioId}`
    pub async fn enrollments_for_user(
        &self,
        session: &Session,
        usuario_id: &UserId,
    ) -> GatewayResult<Vec<Enrollment>> {
        let url = self.url(&format!("/inscripciones/usuario/{usuario_id}"));
        let envelope: ApiEnvelope<EnrollmentListData> =
            self.send(self.authorized(self.http.get(url), session)).await?;
        Ok(require_data(envelope)?.inscripciones)
    }

    /// `POST /inscripciones/crear` — returns the server-assigned id when the
    /// response carries one.
    pub async fn create_enrollment(
        &self,
        session: &Session,
        enrollment: &NewEnrollment,
    ) -> GatewayResult<Option<EnrollmentId>> {
        let envelope: ApiEnvelope<CreatedData> = self
            .send(
                self.authorized(self.http.post(self.url("/inscripciones/crear")), session)
                    .json(enrollment),
            )
            .await?;
        Ok(require_success(envelope)?
            .and_then(|d| d.id)
            .map(EnrollmentId))
    }

    /// `PUT /inscripciones/update/{id}`
    pub async fn update_enrollment(
        &self,
        session: &Session,
        id: &EnrollmentId,
        update: &EnrollmentUpdate,
    ) -> GatewayResult<()> {
        let url = self.url(&format!("/inscripciones/update/{id}"));
        let envelope: ApiEnvelope<serde_json::Value> = self
            .send(self.authorized(self.http.put(url), session).json(update))
            .await?;
        require_success(envelope).map(|_| ())
    }

    /// `DELETE /inscripciones/delete/{id}`
    pub async fn delete_enrollment(
        &self,
        session: &Session,
        id: &EnrollmentId,
    ) -> GatewayResult<()> {
        let url = self.url(&format!("/inscripciones/delete/{id}"));
        let envelope: ApiEnvelope<serde_json::Value> =
            self.send(self.authorized(self.http.delete(url), session)).await?;
        require_success(envelope).map(|_| ())
    }

    /// Single-attempt send: non-2xx statuses become `GatewayError::Api`
    /// carrying the server's message when one can be extracted from the
    /// envelope, the raw body text otherwise.
    async fn send<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> GatewayResult<ApiEnvelope<T>> {
        let response = builder.send().await?;
        let status = response.status();
        debug!(status = %status, "gateway response");
        if !status.is_success() {
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message: error_message(status, response.text().await.unwrap_or_default()),
            });
        }
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|err| {
            GatewayError::Envelope(format!("failed to decode response body: {err}"))
        })
    }
}

fn error_message(status: StatusCode, body: String) -> String {
    if let Ok(envelope) = serde_json::from_str::<ApiEnvelope<serde_json::Value>>(&body) {
        if let Some(message) = envelope.message {
            return message;
        }
    }
    if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unknown server error")
            .to_string()
    } else {
        body
    }
}

/// A 2xx response can still carry a business failure in its envelope
/// (`type != "success"`); map that to an `Api` error so callers treat it
/// like any other server-reported failure.
fn require_success<T>(envelope: ApiEnvelope<T>) -> GatewayResult<Option<T>> {
    if envelope.is_success() {
        Ok(envelope.data)
    } else {
        Err(GatewayError::Api {
            status: 200,
            message: envelope
                .message
                .unwrap_or_else(|| "operación rechazada por el servidor".to_string()),
        })
    }
}

fn require_data<T>(envelope: ApiEnvelope<T>) -> GatewayResult<T> {
    require_success(envelope)?
        .ok_or_else(|| GatewayError::Envelope("response envelope carried no data".to_string()))
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
