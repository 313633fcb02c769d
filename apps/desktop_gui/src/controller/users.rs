//! State for the user administration screen: listing, create/edit modals
//! with field-scoped validation, and the profile lookup popup.

use shared::{
    domain::{Profile, Role, User, UserId},
    protocol::{NewProfile, NewUser, UserUpdate},
};
use tracing::warn;

use crate::controller::validation;

#[derive(Debug, Clone, PartialEq)]
pub struct UserForm {
    pub nombre: String,
    pub apellido: String,
    pub dni: String,
    pub email: String,
    pub telefono: String,
    pub password: String,
    pub rol: Role,
}

impl UserForm {
    fn empty() -> Self {
        Self {
            nombre: String::new(),
            apellido: String::new(),
            dni: String::new(),
            email: String::new(),
            telefono: String::new(),
            password: String::new(),
            rol: Role::Interno,
        }
    }

    fn seeded_from(user: &User) -> Self {
        Self {
            nombre: user.nombre.clone(),
            apellido: user.apellido.clone(),
            dni: user.dni.clone(),
            email: user.email.clone(),
            telefono: user.telefono.clone().unwrap_or_default(),
            password: String::new(),
            rol: user.rol,
        }
    }

    fn telefono_payload(&self) -> Option<String> {
        let telefono = self.telefono.trim();
        (!telefono.is_empty()).then(|| telefono.to_string())
    }
}

/// One message per field; the UI clears an entry as soon as its field
/// changes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserFormErrors {
    pub nombre: Option<String>,
    pub apellido: Option<String>,
    pub dni: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl UserFormErrors {
    pub fn is_clean(&self) -> bool {
        self.nombre.is_none()
            && self.apellido.is_none()
            && self.dni.is_none()
            && self.email.is_none()
            && self.password.is_none()
    }
}

fn validate(form: &UserForm, password_required: bool) -> UserFormErrors {
    let mut errors = UserFormErrors::default();
    if !validation::required(&form.nombre) {
        errors.nombre = Some("El nombre es obligatorio.".to_string());
    }
    if !validation::required(&form.apellido) {
        errors.apellido = Some("El apellido es obligatorio.".to_string());
    }
    if !validation::is_valid_dni(form.dni.trim()) {
        errors.dni = Some("El DNI debe tener exactamente 8 dígitos.".to_string());
    }
    if !validation::is_valid_email(form.email.trim()) {
        errors.email = Some("El correo no tiene un formato válido.".to_string());
    }
    if password_required && !validation::is_valid_password(&form.password) {
        errors.password = Some("La contraseña debe tener al menos 6 caracteres.".to_string());
    }
    errors
}

/// Reintegration profile captured alongside a new inmate account. Dates are
/// kept as raw text until submit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileForm {
    pub delito: String,
    pub sentencia_anios: String,
    pub establecimiento: String,
    pub nivel_educativo: String,
    pub ocupacion_anterior: String,
    pub fecha_ingreso: String,
}

impl ProfileForm {
    fn payload(&self, usuario_id: UserId) -> Option<NewProfile> {
        if !validation::required(&self.delito) || !validation::required(&self.fecha_ingreso) {
            return None;
        }
        let sentencia_anios = self.sentencia_anios.trim().parse::<f64>().ok();
        let optional = |value: &str| {
            let value = value.trim();
            (!value.is_empty()).then(|| value.to_string())
        };
        Some(NewProfile {
            usuario_id,
            delito: self.delito.trim().to_string(),
            sentencia_anios,
            establecimiento: optional(&self.establecimiento),
            nivel_educativo: optional(&self.nivel_educativo),
            ocupacion_anterior: optional(&self.ocupacion_anterior),
            fecha_ingreso: self.fecha_ingreso.trim().to_string(),
        })
    }
}

pub enum UserModal {
    Create {
        form: UserForm,
        include_profile: bool,
        profile: ProfileForm,
        errors: UserFormErrors,
    },
    Edit {
        id: UserId,
        form: UserForm,
        errors: UserFormErrors,
    },
}

pub enum UserSubmit {
    Create {
        user: NewUser,
        profile: Option<NewProfile>,
    },
    Update {
        id: UserId,
        update: UserUpdate,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProfileView {
    Loading,
    Ready(Profile),
    Failed(String),
}

pub struct UsersScreen {
    pub users: Vec<User>,
    pub search: String,
    pub rol_filter: Option<Role>,
    pub modal: Option<UserModal>,
    pub profile_popup: Option<(UserId, ProfileView)>,
    pub banner: Option<String>,
    pub loading: bool,
    pub saving: bool,
}

impl UsersScreen {
    pub fn new() -> Self {
        Self {
            users: Vec::new(),
            search: String::new(),
            rol_filter: None,
            modal: None,
            profile_popup: None,
            banner: None,
            loading: false,
            saving: false,
        }
    }

    pub fn begin_load(&mut self) {
        self.loading = true;
    }

    pub fn apply_loaded(&mut self, users: Vec<User>) {
        self.users = users;
        self.loading = false;
        self.banner = None;
    }

    pub fn apply_load_failed(&mut self, message: &str) {
        warn!(error = message, "user load failed");
        self.loading = false;
        self.banner = Some(format!("No se pudieron cargar los usuarios: {message}"));
    }

    pub fn visible_rows(&self) -> Vec<&User> {
        let needle = self.search.trim().to_lowercase();
        self.users
            .iter()
            .filter(|user| {
                needle.is_empty()
                    || format!("{} {} {}", user.full_name(), user.dni, user.email)
                        .to_lowercase()
                        .contains(&needle)
            })
            .filter(|user| self.rol_filter.map(|rol| user.rol == rol).unwrap_or(true))
            .collect()
    }

    pub fn open_create(&mut self) {
        self.modal = Some(UserModal::Create {
            form: UserForm::empty(),
            include_profile: false,
            profile: ProfileForm::default(),
            errors: UserFormErrors::default(),
        });
    }

    pub fn open_edit(&mut self, user: &User) {
        self.modal = Some(UserModal::Edit {
            id: user.id.clone(),
            form: UserForm::seeded_from(user),
            errors: UserFormErrors::default(),
        });
    }

    pub fn close_modal(&mut self) {
        self.modal = None;
        self.saving = false;
    }

    /// Validates the open modal; an invalid form stays open with its errors
    /// populated and nothing is sent.
    pub fn submit(&mut self) -> Option<UserSubmit> {
        let modal = self.modal.as_mut()?;
        match modal {
            UserModal::Create {
                form,
                include_profile,
                profile,
                errors,
            } => {
                *errors = validate(form, true);
                if !errors.is_clean() {
                    return None;
                }
                let user = NewUser {
                    nombre: form.nombre.trim().to_string(),
                    apellido: form.apellido.trim().to_string(),
                    dni: form.dni.trim().to_string(),
                    email: form.email.trim().to_string(),
                    password: form.password.clone(),
                    telefono: form.telefono_payload(),
                    rol: form.rol,
                };
                // Profile capture is only offered for enrollable roles and
                // needs the server-assigned user id, so the worker resolves
                // it after the insert.
                let profile = (*include_profile && form.rol.is_eligible())
                    .then(|| profile.payload(UserId(String::new())))
                    .flatten();
                self.saving = true;
                Some(UserSubmit::Create { user, profile })
            }
            UserModal::Edit { id, form, errors } => {
                *errors = validate(form, false);
                if !errors.is_clean() {
                    return None;
                }
                let update = UserUpdate {
                    nombre: form.nombre.trim().to_string(),
                    apellido: form.apellido.trim().to_string(),
                    dni: form.dni.trim().to_string(),
                    email: form.email.trim().to_string(),
                    telefono: form.telefono_payload(),
                    rol: form.rol,
                };
                self.saving = true;
                Some(UserSubmit::Update {
                    id: id.clone(),
                    update,
                })
            }
        }
    }

    pub fn apply_saved(&mut self) {
        self.saving = false;
        self.modal = None;
        self.banner = None;
    }

    /// The modal stays open with the operator's input intact.
    pub fn apply_save_failed(&mut self, message: &str) {
        warn!(error = message, "user save failed");
        self.saving = false;
        self.banner = Some(format!("No se pudo guardar el usuario: {message}"));
    }

    // ---- profile popup ----

    pub fn request_profile(&mut self, usuario_id: UserId) {
        self.profile_popup = Some((usuario_id, ProfileView::Loading));
    }

    pub fn apply_profile_loaded(&mut self, profile: Profile) {
        if let Some((id, view)) = &mut self.profile_popup {
            if *id == profile.usuario_id {
                *view = ProfileView::Ready(profile);
            }
        }
    }

    pub fn apply_profile_failed(&mut self, usuario_id: &UserId, message: String) {
        if let Some((id, view)) = &mut self.profile_popup {
            if id == usuario_id {
                *view = ProfileView::Failed(message);
            }
        }
    }

    pub fn close_profile(&mut self) {
        self.profile_popup = None;
    }
}

impl Default for UsersScreen {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, nombre: &str, rol: Role) -> User {
        User {
            id: UserId::from(id),
            nombre: nombre.to_string(),
            apellido: "Paredes".to_string(),
            dni: "40302010".to_string(),
            email: format!("{nombre}@correo.gov").to_lowercase(),
            telefono: None,
            rol,
        }
    }

    fn fill_valid_create(screen: &mut UsersScreen) {
        screen.open_create();
        let Some(UserModal::Create { form, .. }) = &mut screen.modal else {
            panic!("create modal open");
        };
        form.nombre = "Luis".to_string();
        form.apellido = "Paredes".to_string();
        form.dni = "40302010".to_string();
        form.email = "luis@correo.gov".to_string();
        form.password = "secreto".to_string();
        form.rol = Role::Interno;
    }

    #[test]
    fn search_and_role_filter_restrict_visible_rows() {
        let mut screen = UsersScreen::new();
        screen.apply_loaded(vec![
            user("1", "Luis", Role::Interno),
            user("2", "Marta", Role::Docente),
        ]);

        screen.search = "marta".to_string();
        assert_eq!(screen.visible_rows().len(), 1);

        screen.search.clear();
        screen.rol_filter = Some(Role::Interno);
        let rows = screen.visible_rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].nombre, "Luis");
    }

    #[test]
    fn invalid_create_form_populates_field_errors_and_sends_nothing() {
        let mut screen = UsersScreen::new();
        screen.open_create();
        let Some(UserModal::Create { form, .. }) = &mut screen.modal else {
            panic!("create modal open");
        };
        form.nombre = "Luis".to_string();
        form.dni = "123".to_string();
        form.email = "sin-arroba".to_string();
        form.password = "corta".to_string();

        assert!(screen.submit().is_none());
        assert!(!screen.saving);
        let Some(UserModal::Create { errors, .. }) = &screen.modal else {
            panic!("modal still open");
        };
        assert!(errors.apellido.is_some());
        assert!(errors.dni.is_some());
        assert!(errors.email.is_some());
        assert!(errors.password.is_some());
        assert!(errors.nombre.is_none());
    }

    #[test]
    fn valid_create_form_builds_the_payload() {
        let mut screen = UsersScreen::new();
        fill_valid_create(&mut screen);

        let Some(UserSubmit::Create { user, profile }) = screen.submit() else {
            panic!("create payload");
        };
        assert_eq!(user.dni, "40302010");
        assert_eq!(user.telefono, None);
        assert!(profile.is_none());
        assert!(screen.saving);
    }

    #[test]
    fn profile_is_only_attached_for_enrollable_roles() {
        let mut screen = UsersScreen::new();
        fill_valid_create(&mut screen);
        let Some(UserModal::Create {
            form,
            include_profile,
            profile,
            ..
        }) = &mut screen.modal
        else {
            panic!("create modal open");
        };
        *include_profile = true;
        profile.delito = "Hurto".to_string();
        profile.fecha_ingreso = "2022-05-10".to_string();
        profile.sentencia_anios = "3.5".to_string();
        form.rol = Role::Docente;

        let Some(UserSubmit::Create { profile, .. }) = screen.submit() else {
            panic!("create payload");
        };
        assert!(profile.is_none());

        fill_valid_create(&mut screen);
        let Some(UserModal::Create {
            include_profile,
            profile,
            ..
        }) = &mut screen.modal
        else {
            panic!("create modal open");
        };
        *include_profile = true;
        profile.delito = "Hurto".to_string();
        profile.fecha_ingreso = "2022-05-10".to_string();
        profile.sentencia_anios = "3.5".to_string();

        let Some(UserSubmit::Create { profile, .. }) = screen.submit() else {
            panic!("create payload");
        };
        let profile = profile.expect("profile payload");
        assert_eq!(profile.delito, "Hurto");
        assert_eq!(profile.sentencia_anios, Some(3.5));
    }

    #[test]
    fn edit_form_does_not_require_a_password() {
        let mut screen = UsersScreen::new();
        let existing = user("1", "Luis", Role::Interno);
        screen.apply_loaded(vec![existing.clone()]);
        screen.open_edit(&existing);

        let Some(UserSubmit::Update { id, update }) = screen.submit() else {
            panic!("update payload");
        };
        assert_eq!(id, existing.id);
        assert_eq!(update.nombre, "Luis");
    }

    #[test]
    fn failed_save_keeps_the_modal_open() {
        let mut screen = UsersScreen::new();
        fill_valid_create(&mut screen);
        screen.submit().expect("payload");
        screen.apply_save_failed("DNI duplicado");

        assert!(screen.modal.is_some());
        assert!(!screen.saving);
        assert!(screen.banner.as_deref().is_some_and(|b| b.contains("DNI duplicado")));
    }

    #[test]
    fn profile_popup_ignores_results_for_other_users() {
        let mut screen = UsersScreen::new();
        screen.request_profile(UserId::from("1"));
        screen.apply_profile_failed(&UserId::from("2"), "no existe".to_string());
        assert_eq!(
            screen.profile_popup,
            Some((UserId::from("1"), ProfileView::Loading))
        );
    }
}
