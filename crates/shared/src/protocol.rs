//! Wire shapes for the reintegration backend. Every response is wrapped in
//! `{ "type": ..., "message": ..., "data": ... }`; list payloads live one
//! level deeper under an entity-named key.

use serde::{Deserialize, Serialize};

use crate::domain::{
    Enrollment, EnrollmentStatus, Profile, Program, ProgramId, ProgramKind, Role, User, UserId,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    pub fn is_success(&self) -> bool {
        self.kind == "success"
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserListData {
    pub usuarios: Vec<User>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProgramListData {
    // Some backend builds omit the key entirely on an empty listing.
    #[serde(default)]
    pub programas: Vec<Program>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnrollmentListData {
    pub inscripciones: Vec<Enrollment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileData {
    pub perfil: Profile,
}

/// Login hands back the authenticated user with its bearer token inlined;
/// the whole object is what gets persisted as the session principal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    #[serde(flatten)]
    pub user: User,
    pub token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginData {
    pub user: AuthenticatedUser,
}

/// Create endpoints may or may not echo the new row's id.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreatedData {
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub nombre: String,
    pub apellido: String,
    pub dni: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telefono: Option<String>,
    pub rol: Role,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    pub nombre: String,
    pub apellido: String,
    pub dni: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telefono: Option<String>,
    pub rol: Role,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProfile {
    pub usuario_id: UserId,
    pub delito: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentencia_anios: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub establecimiento: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nivel_educativo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ocupacion_anterior: Option<String>,
    pub fecha_ingreso: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProgram {
    pub nombre: String,
    pub descripcion: String,
    pub tipo: ProgramKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEnrollment {
    pub usuario_id: UserId,
    pub programa_id: ProgramId,
    pub estado: EnrollmentStatus,
}

/// Inline-edit payload; an absent grade is omitted from the body rather
/// than sent as null.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentUpdate {
    pub estado: EnrollmentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nota_final: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_tolerates_missing_data() {
        let raw = r#"{ "type": "error", "message": "DNI duplicado" }"#;
        let envelope: ApiEnvelope<UserListData> =
            serde_json::from_str(raw).expect("deserialize");
        assert!(!envelope.is_success());
        assert_eq!(envelope.message.as_deref(), Some("DNI duplicado"));
        assert!(envelope.data.is_none());
    }

    #[test]
    fn program_listing_defaults_to_empty_on_missing_key() {
        let raw = r#"{ "type": "success", "data": {} }"#;
        let envelope: ApiEnvelope<ProgramListData> =
            serde_json::from_str(raw).expect("deserialize");
        assert!(envelope.data.expect("data").programas.is_empty());
    }

    #[test]
    fn enrollment_update_omits_absent_grade() {
        let body = serde_json::to_value(EnrollmentUpdate {
            estado: EnrollmentStatus::Finalizado,
            nota_final: None,
        })
        .expect("serialize");
        assert_eq!(body, serde_json::json!({ "estado": "FINALIZADO" }));
    }

    #[test]
    fn authenticated_user_flattens_token_next_to_user_fields() {
        let raw = r#"{
            "id": "1", "nombre": "Ana", "apellido": "Sosa", "dni": "11223344",
            "email": "ana@correo.gov", "rol": "ADMIN", "token": "jwt-abc"
        }"#;
        let principal: AuthenticatedUser = serde_json::from_str(raw).expect("deserialize");
        assert_eq!(principal.token, "jwt-abc");
        assert_eq!(principal.user.rol, Role::Admin);
    }
}
