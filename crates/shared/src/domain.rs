use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

id_newtype!(UserId);
id_newtype!(ProgramId);
id_newtype!(EnrollmentId);

/// Wire role strings are fixed by the backend; INTERNO and EX_INTERNO are
/// the only roles that may hold a profile or an enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "ADMIN")]
    Admin,
    #[serde(rename = "DOCENTE")]
    Docente,
    #[serde(rename = "PSICOLOGO")]
    Psicologo,
    #[serde(rename = "INTERNO")]
    Interno,
    #[serde(rename = "EX_INTERNO")]
    ExInterno,
}

impl Role {
    pub fn is_eligible(self) -> bool {
        matches!(self, Role::Interno | Role::ExInterno)
    }

    pub fn label(self) -> &'static str {
        match self {
            Role::Admin => "Administrador",
            Role::Docente => "Docente",
            Role::Psicologo => "Psicólogo",
            Role::Interno => "Interno",
            Role::ExInterno => "Ex Interno",
        }
    }

    pub const ALL: [Role; 5] = [
        Role::Admin,
        Role::Docente,
        Role::Psicologo,
        Role::Interno,
        Role::ExInterno,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnrollmentStatus {
    #[serde(rename = "INSCRITO")]
    Inscrito,
    #[serde(rename = "FINALIZADO")]
    Finalizado,
}

impl EnrollmentStatus {
    pub fn label(self) -> &'static str {
        match self {
            EnrollmentStatus::Inscrito => "Inscrito",
            EnrollmentStatus::Finalizado => "Finalizado",
        }
    }

    pub const ALL: [EnrollmentStatus; 2] =
        [EnrollmentStatus::Inscrito, EnrollmentStatus::Finalizado];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgramKind {
    #[serde(rename = "EDUCATIVO")]
    Educativo,
    #[serde(rename = "LABORAL")]
    Laboral,
}

impl ProgramKind {
    pub fn label(self) -> &'static str {
        match self {
            ProgramKind::Educativo => "Educativo",
            ProgramKind::Laboral => "Laboral",
        }
    }

    pub fn wire_name(self) -> &'static str {
        match self {
            ProgramKind::Educativo => "EDUCATIVO",
            ProgramKind::Laboral => "LABORAL",
        }
    }

    pub const ALL: [ProgramKind; 2] = [ProgramKind::Educativo, ProgramKind::Laboral];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub nombre: String,
    pub apellido: String,
    pub dni: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telefono: Option<String>,
    pub rol: Role,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.nombre, self.apellido)
    }
}

/// Penitentiary biographical record; only INTERNO/EX_INTERNO users carry one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub usuario_id: UserId,
    pub delito: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentencia_anios: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub establecimiento: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nivel_educativo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocupacion_anterior: Option<String>,
    pub fecha_ingreso: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fecha_salida: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Program {
    pub id: ProgramId,
    pub nombre: String,
    #[serde(default)]
    pub descripcion: String,
    pub tipo: ProgramKind,
}

/// Enrollment rows arrive with a denormalized user snapshot and program name
/// taken at creation time; a renamed program shows its old name here until a
/// full reload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub usuario_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usuario: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub programa_id: Option<ProgramId>,
    pub nombre_programa: String,
    pub estado: EnrollmentStatus,
    pub fecha_inscripcion: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nota_final: Option<f64>,
}

impl Enrollment {
    /// Text the enrollment list search runs against: enrolled user's full
    /// name plus the denormalized program name.
    pub fn search_text(&self) -> String {
        let who = self
            .usuario
            .as_ref()
            .map(|u| u.full_name())
            .unwrap_or_default();
        format!("{who} {}", self.nombre_programa)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_wire_names_round_trip() {
        for role in Role::ALL {
            let wire = serde_json::to_string(&role).expect("serialize");
            let back: Role = serde_json::from_str(&wire).expect("deserialize");
            assert_eq!(back, role);
        }
        assert_eq!(
            serde_json::to_string(&Role::ExInterno).expect("serialize"),
            "\"EX_INTERNO\""
        );
    }

    #[test]
    fn only_inmate_roles_are_eligible() {
        assert!(Role::Interno.is_eligible());
        assert!(Role::ExInterno.is_eligible());
        assert!(!Role::Admin.is_eligible());
        assert!(!Role::Docente.is_eligible());
        assert!(!Role::Psicologo.is_eligible());
    }

    #[test]
    fn enrollment_deserializes_from_wire_shape() {
        let raw = r#"{
            "id": "42",
            "usuarioId": "7",
            "usuario": {
                "id": "7",
                "nombre": "Luis",
                "apellido": "Paredes",
                "dni": "40302010",
                "email": "luis@correo.gov",
                "rol": "INTERNO"
            },
            "nombrePrograma": "Carpintería",
            "estado": "INSCRITO",
            "fechaInscripcion": "2024-03-11"
        }"#;
        let enrollment: Enrollment = serde_json::from_str(raw).expect("deserialize");
        assert_eq!(enrollment.id, EnrollmentId::from("42"));
        assert_eq!(enrollment.estado, EnrollmentStatus::Inscrito);
        assert_eq!(enrollment.nota_final, None);
        assert_eq!(enrollment.search_text(), "Luis Paredes Carpintería");
    }
}
