//! Desktop shell: login card, role-conditional navigation, and the three
//! administration screens. All business rules live in the controller layer;
//! this file only echoes state and forwards intent.

use crossbeam_channel::{Receiver, Sender, TrySendError};
use eframe::egui;
use shared::{
    domain::{Enrollment, EnrollmentStatus, Profile, Program, ProgramKind, Role, User},
    protocol::AuthenticatedUser,
};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::enrollments::{grade_cell, EnrollmentWorkspace};
use crate::controller::events::{category_label, UiError, UiErrorContext, UiEvent};
use crate::controller::programs::ProgramsScreen;
use crate::controller::users::{ProfileView, UserModal, UserSubmit, UsersScreen};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ViewState {
    Login,
    Main,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Enrollments,
    Users,
    Programs,
}

#[derive(Default)]
struct LoginForm {
    email: String,
    password: String,
    busy: bool,
    error: Option<String>,
}

pub struct DesktopGuiApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,

    view: ViewState,
    active: Screen,
    login: LoginForm,
    principal: Option<AuthenticatedUser>,
    status: String,

    enrollments: EnrollmentWorkspace,
    users: UsersScreen,
    programs: ProgramsScreen,
}

impl DesktopGuiApp {
    pub fn new(cmd_tx: Sender<BackendCommand>, ui_rx: Receiver<UiEvent>) -> Self {
        Self {
            cmd_tx,
            ui_rx,
            view: ViewState::Login,
            active: Screen::Enrollments,
            login: LoginForm::default(),
            principal: None,
            status: "Sin sesión".to_string(),
            enrollments: EnrollmentWorkspace::new(),
            users: UsersScreen::new(),
            programs: ProgramsScreen::new(),
        }
    }

    fn queue(&mut self, command: BackendCommand) {
        match self.cmd_tx.try_send(command) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.status = "Demasiadas operaciones pendientes, intente de nuevo".to_string();
            }
            Err(TrySendError::Disconnected(_)) => {
                self.status = "El proceso de red se detuvo; reinicie la aplicación".to_string();
            }
        }
    }

    fn role(&self) -> Option<Role> {
        self.principal.as_ref().map(|p| p.user.rol)
    }

    fn nav_screens(&self) -> Vec<Screen> {
        match self.role() {
            Some(Role::Admin) => vec![Screen::Enrollments, Screen::Users, Screen::Programs],
            Some(Role::Docente) | Some(Role::Psicologo) => {
                vec![Screen::Enrollments, Screen::Programs]
            }
            _ => vec![Screen::Enrollments],
        }
    }

    fn open_screen(&mut self, screen: Screen) {
        self.active = screen;
        match screen {
            Screen::Enrollments => {
                if self.enrollments.enrollments.is_empty() && !self.enrollments.loading {
                    self.enrollments.begin_load();
                    self.queue(BackendCommand::LoadEnrollmentWorkspace);
                }
            }
            Screen::Users => {
                if self.users.users.is_empty() && !self.users.loading {
                    self.users.begin_load();
                    self.queue(BackendCommand::LoadUsers);
                }
            }
            Screen::Programs => {
                if self.programs.programs.is_empty() && !self.programs.loading {
                    self.programs.begin_load();
                    self.queue(BackendCommand::LoadPrograms);
                }
            }
        }
    }

    // ---- event intake ----

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::LoggedIn(principal) | UiEvent::SessionRestored(principal) => {
                    self.status = format!("Sesión iniciada como {}", principal.user.full_name());
                    self.principal = Some(principal);
                    self.view = ViewState::Main;
                    self.login.busy = false;
                    self.login.password.clear();
                    self.login.error = None;
                    self.enrollments = EnrollmentWorkspace::new();
                    self.users = UsersScreen::new();
                    self.programs = ProgramsScreen::new();
                    self.open_screen(Screen::Enrollments);
                }
                UiEvent::LoggedOut => {
                    self.principal = None;
                    self.view = ViewState::Login;
                    self.status = "Sesión cerrada".to_string();
                }
                UiEvent::Info(message) => {
                    self.status = message;
                }
                UiEvent::EnrollmentWorkspaceLoaded {
                    enrollments,
                    programas,
                    usuarios,
                } => {
                    self.enrollments.apply_loaded(enrollments, programas, usuarios);
                }
                UiEvent::EnrollmentCreated { request, server_id } => {
                    self.enrollments.apply_created(&request, server_id);
                    self.status = "Inscripción registrada".to_string();
                }
                UiEvent::EnrollmentUpdated { id, update } => {
                    self.enrollments.apply_edit_committed(&id, &update);
                    self.status = "Inscripción actualizada".to_string();
                }
                UiEvent::EnrollmentDeleted { id } => {
                    self.enrollments.apply_delete_result(&id, Ok(()));
                    self.status = "Inscripción eliminada".to_string();
                }
                UiEvent::UsersLoaded(users) => {
                    self.users.apply_loaded(users);
                }
                UiEvent::UserSaved => {
                    self.users.apply_saved();
                    self.status = "Usuario guardado".to_string();
                    self.users.begin_load();
                    self.queue(BackendCommand::LoadUsers);
                }
                UiEvent::ProgramsLoaded(programs) => {
                    self.programs.apply_loaded(programs);
                }
                UiEvent::ProgramSaved => {
                    self.programs.apply_saved();
                    self.status = "Programa guardado".to_string();
                    self.programs.begin_load();
                    self.queue(BackendCommand::LoadPrograms);
                }
                UiEvent::ProgramDeleted { id } => {
                    self.programs.apply_delete_result(&id, Ok(()));
                    self.status = "Programa eliminado".to_string();
                }
                UiEvent::ProfileLoaded(profile) => {
                    self.users.apply_profile_loaded(profile);
                }
                UiEvent::Error(err) => self.handle_error(err),
            }
        }
    }

    fn handle_error(&mut self, err: UiError) {
        if err.requires_reauth() && self.view == ViewState::Main {
            self.principal = None;
            self.view = ViewState::Login;
            self.login.error =
                Some("La sesión expiró. Inicie sesión nuevamente.".to_string());
            self.queue(BackendCommand::Logout);
            return;
        }
        match err.context() {
            UiErrorContext::Login => {
                self.login.busy = false;
                self.login.error = Some(login_failure_message(&err));
            }
            UiErrorContext::LoadEnrollments => {
                self.enrollments.apply_load_failed(err.message());
            }
            UiErrorContext::CreateEnrollment => {
                self.enrollments.apply_create_failed(err.message());
            }
            UiErrorContext::SaveEnrollment => {
                self.enrollments.apply_edit_failed(err.message());
            }
            UiErrorContext::DeleteEnrollment => {
                self.enrollments.apply_delete_failed(err.message());
            }
            UiErrorContext::LoadUsers => self.users.apply_load_failed(err.message()),
            UiErrorContext::SaveUser => self.users.apply_save_failed(err.message()),
            UiErrorContext::LoadPrograms => self.programs.apply_load_failed(err.message()),
            UiErrorContext::SaveProgram => self.programs.apply_save_failed(err.message()),
            UiErrorContext::DeleteProgram => {
                self.programs.apply_delete_failed(err.message());
            }
            UiErrorContext::FetchProfile => {
                if let Some((id, _)) = self.users.profile_popup.clone() {
                    self.users.apply_profile_failed(&id, err.message().to_string());
                }
            }
            UiErrorContext::BackendStartup | UiErrorContext::General => {
                self.status = format!("{}: {}", category_label(err.category()), err.message());
            }
        }
    }

    // ---- login ----

    fn try_login(&mut self) {
        let email = self.login.email.trim().to_string();
        if email.is_empty() || self.login.password.is_empty() {
            self.login.error = Some("Ingrese correo y contraseña.".to_string());
            return;
        }
        self.login.busy = true;
        self.login.error = None;
        let password = self.login.password.clone();
        self.queue(BackendCommand::Login { email, password });
    }

    fn show_login_screen(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let avail = ui.available_size();
            ui.add_space((avail.y * 0.15).clamp(20.0, 120.0));
            ui.vertical_centered(|ui| {
                ui.set_width(avail.x.clamp(360.0, 460.0));
                egui::Frame::none()
                    .fill(ui.visuals().faint_bg_color)
                    .rounding(12.0)
                    .stroke(egui::Stroke::new(
                        1.0,
                        ui.visuals().widgets.noninteractive.bg_stroke.color,
                    ))
                    .inner_margin(egui::Margin::symmetric(20, 18))
                    .show(ui, |ui| {
                        ui.heading("Reinserta");
                        ui.weak("Panel de administración del programa de reinserción");
                        ui.add_space(10.0);

                        if let Some(error) = self.login.error.clone() {
                            ui.colored_label(egui::Color32::LIGHT_RED, error);
                            ui.add_space(6.0);
                        }

                        ui.label(egui::RichText::new("Correo").strong());
                        let email_resp = ui.add(
                            egui::TextEdit::singleline(&mut self.login.email)
                                .hint_text("ana@correo.gov")
                                .desired_width(f32::INFINITY),
                        );
                        if email_resp.changed() {
                            self.login.error = None;
                        }
                        ui.add_space(4.0);
                        ui.label(egui::RichText::new("Contraseña").strong());
                        let password_resp = ui.add(
                            egui::TextEdit::singleline(&mut self.login.password)
                                .password(true)
                                .desired_width(f32::INFINITY),
                        );
                        if password_resp.changed() {
                            self.login.error = None;
                        }

                        let enter = ctx.input(|i| i.key_pressed(egui::Key::Enter));
                        if enter && (email_resp.has_focus() || password_resp.has_focus()) {
                            self.try_login();
                        }

                        ui.add_space(10.0);
                        let button = egui::Button::new(
                            egui::RichText::new("Ingresar").strong(),
                        )
                        .min_size(egui::vec2(ui.available_width(), 34.0));
                        if ui.add_enabled(!self.login.busy, button).clicked() {
                            self.try_login();
                        }
                        if self.login.busy {
                            ui.add_space(6.0);
                            ui.horizontal(|ui| {
                                ui.spinner();
                                ui.weak("Verificando credenciales…");
                            });
                        }
                    });
            });
        });
    }

    // ---- shell ----

    fn show_shell(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("nav").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Reinserta");
                ui.separator();
                let screens = self.nav_screens();
                let mut clicked = None;
                for screen in screens {
                    let selected = self.active == screen;
                    if ui.selectable_label(selected, screen_label(screen)).clicked() && !selected
                    {
                        clicked = Some(screen);
                    }
                }
                if let Some(screen) = clicked {
                    self.open_screen(screen);
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Cerrar sesión").clicked() {
                        self.queue(BackendCommand::Logout);
                    }
                    if let Some(principal) = &self.principal {
                        ui.weak(format!(
                            "{} · {}",
                            principal.user.full_name(),
                            principal.user.rol.label()
                        ));
                    }
                });
            });
        });

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.small("Estado:");
                ui.small(egui::RichText::new(&self.status).weak());
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| match self.active {
            Screen::Enrollments => self.show_enrollments_screen(ui),
            Screen::Users => self.show_users_screen(ui),
            Screen::Programs => self.show_programs_screen(ui),
        });

        self.show_enrollment_dialogs(ctx);
        self.show_user_dialogs(ctx);
        self.show_program_dialogs(ctx);
    }

    fn show_banner(ui: &mut egui::Ui, banner: &Option<String>) {
        if let Some(message) = banner {
            egui::Frame::none()
                .fill(egui::Color32::from_rgb(111, 53, 53))
                .rounding(8.0)
                .inner_margin(egui::Margin::symmetric(10, 8))
                .show(ui, |ui| {
                    ui.label(egui::RichText::new(message).color(egui::Color32::WHITE));
                });
            ui.add_space(6.0);
        }
    }

    // ---- enrollments screen ----

    fn show_enrollments_screen(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("Inscripciones");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("Nueva inscripción").clicked() {
                    self.enrollments.open_create();
                }
                if ui
                    .add_enabled(!self.enrollments.loading, egui::Button::new("Actualizar"))
                    .clicked()
                {
                    self.enrollments.begin_load();
                    self.queue(BackendCommand::LoadEnrollmentWorkspace);
                }
            });
        });
        ui.add_space(6.0);
        Self::show_banner(ui, &self.enrollments.banner);

        ui.horizontal(|ui| {
            ui.label("Buscar:");
            ui.add(
                egui::TextEdit::singleline(&mut self.enrollments.search)
                    .hint_text("nombre, apellido o programa")
                    .desired_width(240.0),
            );
            ui.label("Estado:");
            egui::ComboBox::from_id_source("estado_filter")
                .selected_text(
                    self.enrollments
                        .estado_filter
                        .map(|e| e.label())
                        .unwrap_or("Todos"),
                )
                .show_ui(ui, |ui| {
                    ui.selectable_value(&mut self.enrollments.estado_filter, None, "Todos");
                    for estado in EnrollmentStatus::ALL {
                        ui.selectable_value(
                            &mut self.enrollments.estado_filter,
                            Some(estado),
                            estado.label(),
                        );
                    }
                });
        });
        ui.add_space(8.0);

        if self.enrollments.loading {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.weak("Cargando inscripciones…");
            });
            return;
        }

        let rows: Vec<Enrollment> = self
            .enrollments
            .visible_rows()
            .into_iter()
            .cloned()
            .collect();
        if rows.is_empty() {
            ui.weak("No hay inscripciones que coincidan con el filtro.");
            return;
        }

        egui::ScrollArea::vertical().show(ui, |ui| {
            egui::Grid::new("enrollment_table")
                .num_columns(6)
                .striped(true)
                .spacing(egui::vec2(16.0, 6.0))
                .show(ui, |ui| {
                    ui.strong("Interno");
                    ui.strong("Programa");
                    ui.strong("Fecha");
                    ui.strong("Estado");
                    ui.strong("Nota");
                    ui.strong("");
                    ui.end_row();

                    for row in &rows {
                        self.show_enrollment_row(ui, row);
                    }
                });
        });
    }

    fn show_enrollment_row(&mut self, ui: &mut egui::Ui, row: &Enrollment) {
        let editing = self
            .enrollments
            .edit_slot()
            .map(|(id, _)| id == &row.id)
            .unwrap_or(false);

        ui.label(
            row.usuario
                .as_ref()
                .map(|u| u.full_name())
                .unwrap_or_else(|| "—".to_string()),
        );
        ui.label(&row.nombre_programa);
        ui.label(row.fecha_inscripcion.format("%d/%m/%Y").to_string());

        if editing {
            if let Some(draft) = self.enrollments.draft_mut(&row.id) {
                egui::ComboBox::from_id_source(("estado_edit", &row.id.0))
                    .selected_text(draft.estado.label())
                    .show_ui(ui, |ui| {
                        for estado in EnrollmentStatus::ALL {
                            ui.selectable_value(&mut draft.estado, estado, estado.label());
                        }
                    });
                ui.add(
                    egui::TextEdit::singleline(&mut draft.nota_final)
                        .hint_text("0–20")
                        .desired_width(60.0),
                );
            }
            ui.horizontal(|ui| {
                if ui.button("Guardar").clicked() {
                    if let Some((id, update)) = self.enrollments.commit_request() {
                        self.queue(BackendCommand::UpdateEnrollment { id, update });
                    }
                }
                if ui.button("Cancelar").clicked() {
                    self.enrollments.cancel_edit();
                }
            });
        } else {
            ui.label(row.estado.label());
            ui.label(grade_cell(row.nota_final));
            ui.horizontal(|ui| {
                if ui.button("Editar").clicked() {
                    self.enrollments.begin_edit(&row.id);
                }
                if ui.button("Eliminar").clicked() {
                    self.enrollments.request_delete(row.id.clone());
                }
            });
        }
        ui.end_row();
    }

    fn show_enrollment_dialogs(&mut self, ctx: &egui::Context) {
        // delete confirmation
        if self.enrollments.pending_delete().is_some() {
            let mut confirm = false;
            let mut cancel = false;
            egui::Window::new("Eliminar inscripción")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
                .show(ctx, |ui| {
                    ui.label("¿Eliminar esta inscripción? Esta acción no se puede deshacer.");
                    ui.add_space(8.0);
                    ui.horizontal(|ui| {
                        if ui
                            .add_enabled(!self.enrollments.deleting, egui::Button::new("Eliminar"))
                            .clicked()
                        {
                            confirm = true;
                        }
                        if ui.button("Cancelar").clicked() {
                            cancel = true;
                        }
                        if self.enrollments.deleting {
                            ui.spinner();
                        }
                    });
                });
            if confirm {
                if let Some(id) = self.enrollments.confirm_delete() {
                    self.queue(BackendCommand::DeleteEnrollment { id });
                }
            } else if cancel {
                self.enrollments.cancel_delete();
            }
        }

        // create modal
        if self.enrollments.create_open {
            let mut submit = false;
            let mut close = false;
            egui::Window::new("Nueva inscripción")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
                .show(ctx, |ui| {
                    ui.label("Interno");
                    let selected_user = self
                        .enrollments
                        .usuarios
                        .iter()
                        .find(|u| u.id.0 == self.enrollments.create_form.usuario_id)
                        .map(|u| u.full_name())
                        .unwrap_or_else(|| "Seleccione…".to_string());
                    let mut picked_user: Option<String> = None;
                    egui::ComboBox::from_id_source("create_usuario")
                        .selected_text(selected_user)
                        .width(240.0)
                        .show_ui(ui, |ui| {
                            for user in &self.enrollments.usuarios {
                                if ui
                                    .selectable_label(
                                        self.enrollments.create_form.usuario_id == user.id.0,
                                        format!("{} ({})", user.full_name(), user.dni),
                                    )
                                    .clicked()
                                {
                                    picked_user = Some(user.id.0.clone());
                                }
                            }
                        });
                    if let Some(id) = picked_user {
                        self.enrollments.create_form.usuario_id = id;
                    }

                    ui.add_space(6.0);
                    ui.label("Programa");
                    let selected_program = self
                        .enrollments
                        .programas
                        .iter()
                        .find(|p| p.id.0 == self.enrollments.create_form.programa_id)
                        .map(|p| p.nombre.clone())
                        .unwrap_or_else(|| "Seleccione…".to_string());
                    let mut picked_program: Option<String> = None;
                    egui::ComboBox::from_id_source("create_programa")
                        .selected_text(selected_program)
                        .width(240.0)
                        .show_ui(ui, |ui| {
                            for program in &self.enrollments.programas {
                                if ui
                                    .selectable_label(
                                        self.enrollments.create_form.programa_id == program.id.0,
                                        format!(
                                            "{} ({})",
                                            program.nombre,
                                            program.tipo.label()
                                        ),
                                    )
                                    .clicked()
                                {
                                    picked_program = Some(program.id.0.clone());
                                }
                            }
                        });
                    if let Some(id) = picked_program {
                        self.enrollments.create_form.programa_id = id;
                    }

                    ui.add_space(10.0);
                    ui.horizontal(|ui| {
                        if ui
                            .add_enabled(!self.enrollments.creating, egui::Button::new("Registrar"))
                            .clicked()
                        {
                            submit = true;
                        }
                        if ui.button("Cancelar").clicked() {
                            close = true;
                        }
                        if self.enrollments.creating {
                            ui.spinner();
                        }
                    });
                });
            if submit {
                if let Some(request) = self.enrollments.create_request() {
                    self.queue(BackendCommand::CreateEnrollment(request));
                }
            } else if close {
                self.enrollments.close_create();
            }
        }
    }

    // ---- users screen ----

    fn show_users_screen(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("Usuarios");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("Nuevo usuario").clicked() {
                    self.users.open_create();
                }
                if ui
                    .add_enabled(!self.users.loading, egui::Button::new("Actualizar"))
                    .clicked()
                {
                    self.users.begin_load();
                    self.queue(BackendCommand::LoadUsers);
                }
            });
        });
        ui.add_space(6.0);
        Self::show_banner(ui, &self.users.banner);

        ui.horizontal(|ui| {
            ui.label("Buscar:");
            ui.add(
                egui::TextEdit::singleline(&mut self.users.search)
                    .hint_text("nombre, DNI o correo")
                    .desired_width(240.0),
            );
            ui.label("Rol:");
            egui::ComboBox::from_id_source("rol_filter")
                .selected_text(self.users.rol_filter.map(|r| r.label()).unwrap_or("Todos"))
                .show_ui(ui, |ui| {
                    ui.selectable_value(&mut self.users.rol_filter, None, "Todos");
                    for rol in Role::ALL {
                        ui.selectable_value(&mut self.users.rol_filter, Some(rol), rol.label());
                    }
                });
        });
        ui.add_space(8.0);

        if self.users.loading {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.weak("Cargando usuarios…");
            });
            return;
        }

        let rows: Vec<User> = self.users.visible_rows().into_iter().cloned().collect();
        if rows.is_empty() {
            ui.weak("No hay usuarios que coincidan con el filtro.");
            return;
        }

        egui::ScrollArea::vertical().show(ui, |ui| {
            egui::Grid::new("user_table")
                .num_columns(5)
                .striped(true)
                .spacing(egui::vec2(16.0, 6.0))
                .show(ui, |ui| {
                    ui.strong("Nombre");
                    ui.strong("DNI");
                    ui.strong("Correo");
                    ui.strong("Rol");
                    ui.strong("");
                    ui.end_row();

                    for user in &rows {
                        ui.label(user.full_name());
                        ui.label(&user.dni);
                        ui.label(&user.email);
                        ui.label(user.rol.label());
                        ui.horizontal(|ui| {
                            if ui.button("Editar").clicked() {
                                self.users.open_edit(user);
                            }
                            // no backend endpoint for removing accounts yet
                            ui.add_enabled(false, egui::Button::new("Eliminar"))
                                .on_disabled_hover_text(
                                    "El servidor no permite eliminar usuarios",
                                );
                            if user.rol.is_eligible() && ui.button("Perfil").clicked() {
                                self.users.request_profile(user.id.clone());
                                self.queue(BackendCommand::FetchProfile {
                                    usuario_id: user.id.clone(),
                                });
                            }
                        });
                        ui.end_row();
                    }
                });
        });
    }

    fn show_user_dialogs(&mut self, ctx: &egui::Context) {
        self.show_user_modal(ctx);
        self.show_profile_popup(ctx);
    }

    fn show_user_modal(&mut self, ctx: &egui::Context) {
        if self.users.modal.is_none() {
            return;
        }
        let mut submit = false;
        let mut close = false;
        let saving = self.users.saving;
        let title = match &self.users.modal {
            Some(UserModal::Create { .. }) => "Nuevo usuario",
            Some(UserModal::Edit { .. }) => "Editar usuario",
            None => unreachable!(),
        };

        egui::Window::new(title)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                match self.users.modal.as_mut() {
                    Some(UserModal::Create {
                        form,
                        include_profile,
                        profile,
                        errors,
                    }) => {
                        labeled_field(ui, "Nombre", &mut form.nombre, &mut errors.nombre);
                        labeled_field(ui, "Apellido", &mut form.apellido, &mut errors.apellido);
                        labeled_field(ui, "DNI", &mut form.dni, &mut errors.dni);
                        labeled_field(ui, "Correo", &mut form.email, &mut errors.email);
                        let mut none = None;
                        labeled_field(ui, "Teléfono (opcional)", &mut form.telefono, &mut none);
                        ui.label(egui::RichText::new("Contraseña").strong());
                        let resp = ui.add(
                            egui::TextEdit::singleline(&mut form.password)
                                .password(true)
                                .desired_width(f32::INFINITY),
                        );
                        if resp.changed() {
                            errors.password = None;
                        }
                        if let Some(error) = &errors.password {
                            ui.colored_label(egui::Color32::LIGHT_RED, error);
                        }
                        role_picker(ui, "create_rol", &mut form.rol);

                        if form.rol.is_eligible() {
                            ui.add_space(6.0);
                            ui.checkbox(include_profile, "Registrar perfil penitenciario");
                            if *include_profile {
                                let mut none = None;
                                labeled_field(ui, "Delito", &mut profile.delito, &mut none);
                                labeled_field(
                                    ui,
                                    "Sentencia (años)",
                                    &mut profile.sentencia_anios,
                                    &mut none,
                                );
                                labeled_field(
                                    ui,
                                    "Establecimiento",
                                    &mut profile.establecimiento,
                                    &mut none,
                                );
                                labeled_field(
                                    ui,
                                    "Nivel educativo",
                                    &mut profile.nivel_educativo,
                                    &mut none,
                                );
                                labeled_field(
                                    ui,
                                    "Ocupación anterior",
                                    &mut profile.ocupacion_anterior,
                                    &mut none,
                                );
                                labeled_field(
                                    ui,
                                    "Fecha de ingreso (AAAA-MM-DD)",
                                    &mut profile.fecha_ingreso,
                                    &mut none,
                                );
                            }
                        }
                    }
                    Some(UserModal::Edit { form, errors, .. }) => {
                        labeled_field(ui, "Nombre", &mut form.nombre, &mut errors.nombre);
                        labeled_field(ui, "Apellido", &mut form.apellido, &mut errors.apellido);
                        labeled_field(ui, "DNI", &mut form.dni, &mut errors.dni);
                        labeled_field(ui, "Correo", &mut form.email, &mut errors.email);
                        let mut none = None;
                        labeled_field(ui, "Teléfono (opcional)", &mut form.telefono, &mut none);
                        role_picker(ui, "edit_rol", &mut form.rol);
                    }
                    None => {}
                }

                ui.add_space(10.0);
                ui.horizontal(|ui| {
                    if ui.add_enabled(!saving, egui::Button::new("Guardar")).clicked() {
                        submit = true;
                    }
                    if ui.button("Cancelar").clicked() {
                        close = true;
                    }
                    if saving {
                        ui.spinner();
                    }
                });
            });

        if submit {
            match self.users.submit() {
                Some(UserSubmit::Create { user, profile }) => {
                    self.queue(BackendCommand::CreateUser { user, profile });
                }
                Some(UserSubmit::Update { id, update }) => {
                    self.queue(BackendCommand::UpdateUser { id, update });
                }
                None => {}
            }
        } else if close {
            self.users.close_modal();
        }
    }

    fn show_profile_popup(&mut self, ctx: &egui::Context) {
        let Some((_, view)) = self.users.profile_popup.clone() else {
            return;
        };
        let mut close = false;
        egui::Window::new("Perfil penitenciario")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                match &view {
                    ProfileView::Loading => {
                        ui.horizontal(|ui| {
                            ui.spinner();
                            ui.weak("Cargando perfil…");
                        });
                    }
                    ProfileView::Ready(profile) => show_profile_fields(ui, profile),
                    ProfileView::Failed(message) => {
                        ui.colored_label(
                            egui::Color32::LIGHT_RED,
                            format!("No se pudo cargar el perfil: {message}"),
                        );
                    }
                }
                ui.add_space(8.0);
                if ui.button("Cerrar").clicked() {
                    close = true;
                }
            });
        if close {
            self.users.close_profile();
        }
    }

    // ---- programs screen ----

    fn show_programs_screen(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("Programas");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("Nuevo programa").clicked() {
                    self.programs.open_create();
                }
                if ui
                    .add_enabled(!self.programs.loading, egui::Button::new("Actualizar"))
                    .clicked()
                {
                    self.programs.begin_load();
                    self.queue(BackendCommand::LoadPrograms);
                }
            });
        });
        ui.add_space(6.0);
        Self::show_banner(ui, &self.programs.banner);

        ui.horizontal(|ui| {
            ui.label("Buscar:");
            ui.add(
                egui::TextEdit::singleline(&mut self.programs.search)
                    .hint_text("nombre del programa")
                    .desired_width(240.0),
            );
            ui.label("Tipo:");
            egui::ComboBox::from_id_source("tipo_filter")
                .selected_text(
                    self.programs
                        .tipo_filter
                        .map(|t| t.label())
                        .unwrap_or("Todos"),
                )
                .show_ui(ui, |ui| {
                    ui.selectable_value(&mut self.programs.tipo_filter, None, "Todos");
                    for tipo in ProgramKind::ALL {
                        ui.selectable_value(
                            &mut self.programs.tipo_filter,
                            Some(tipo),
                            tipo.label(),
                        );
                    }
                });
        });
        ui.add_space(8.0);

        if self.programs.loading {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.weak("Cargando programas…");
            });
            return;
        }

        let rows: Vec<Program> = self.programs.visible_rows().into_iter().cloned().collect();
        if rows.is_empty() {
            ui.weak("No hay programas registrados.");
            return;
        }

        egui::ScrollArea::vertical().show(ui, |ui| {
            egui::Grid::new("program_table")
                .num_columns(4)
                .striped(true)
                .spacing(egui::vec2(16.0, 6.0))
                .show(ui, |ui| {
                    ui.strong("Nombre");
                    ui.strong("Tipo");
                    ui.strong("Descripción");
                    ui.strong("");
                    ui.end_row();

                    for program in &rows {
                        ui.label(&program.nombre);
                        ui.label(program.tipo.label());
                        ui.label(&program.descripcion);
                        ui.horizontal(|ui| {
                            if ui.button("Editar").clicked() {
                                self.programs.open_edit(program);
                            }
                            if ui.button("Eliminar").clicked() {
                                self.programs.request_delete(program.id.clone());
                            }
                        });
                        ui.end_row();
                    }
                });
        });
    }

    fn show_program_dialogs(&mut self, ctx: &egui::Context) {
        if self.programs.pending_delete().is_some() {
            let mut confirm = false;
            let mut cancel = false;
            egui::Window::new("Eliminar programa")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
                .show(ctx, |ui| {
                    ui.label("¿Eliminar este programa del catálogo?");
                    ui.add_space(8.0);
                    ui.horizontal(|ui| {
                        if ui
                            .add_enabled(!self.programs.deleting, egui::Button::new("Eliminar"))
                            .clicked()
                        {
                            confirm = true;
                        }
                        if ui.button("Cancelar").clicked() {
                            cancel = true;
                        }
                        if self.programs.deleting {
                            ui.spinner();
                        }
                    });
                });
            if confirm {
                if let Some(id) = self.programs.confirm_delete() {
                    self.queue(BackendCommand::DeleteProgram { id });
                }
            } else if cancel {
                self.programs.cancel_delete();
            }
        }

        if self.programs.modal.is_some() {
            let mut submit = false;
            let mut close = false;
            let saving = self.programs.saving;
            let title = if self
                .programs
                .modal
                .as_ref()
                .is_some_and(|m| m.id.is_some())
            {
                "Editar programa"
            } else {
                "Nuevo programa"
            };
            egui::Window::new(title)
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
                .show(ctx, |ui| {
                    if let Some(modal) = self.programs.modal.as_mut() {
                        if let Some(error) = &modal.error {
                            ui.colored_label(egui::Color32::LIGHT_RED, error);
                            ui.add_space(4.0);
                        }
                        ui.label(egui::RichText::new("Nombre").strong());
                        let resp = ui.add(
                            egui::TextEdit::singleline(&mut modal.form.nombre)
                                .desired_width(f32::INFINITY),
                        );
                        if resp.changed() {
                            modal.error = None;
                        }
                        ui.label(egui::RichText::new("Descripción").strong());
                        ui.add(
                            egui::TextEdit::multiline(&mut modal.form.descripcion)
                                .desired_rows(3)
                                .desired_width(f32::INFINITY),
                        );
                        ui.label(egui::RichText::new("Tipo").strong());
                        egui::ComboBox::from_id_source("program_tipo")
                            .selected_text(modal.form.tipo.label())
                            .show_ui(ui, |ui| {
                                for tipo in ProgramKind::ALL {
                                    ui.selectable_value(&mut modal.form.tipo, tipo, tipo.label());
                                }
                            });
                    }
                    ui.add_space(10.0);
                    ui.horizontal(|ui| {
                        if ui.add_enabled(!saving, egui::Button::new("Guardar")).clicked() {
                            submit = true;
                        }
                        if ui.button("Cancelar").clicked() {
                            close = true;
                        }
                        if saving {
                            ui.spinner();
                        }
                    });
                });
            if submit {
                if let Some((id, program)) = self.programs.submit() {
                    match id {
                        Some(id) => self.queue(BackendCommand::UpdateProgram { id, program }),
                        None => self.queue(BackendCommand::CreateProgram(program)),
                    }
                }
            } else if close {
                self.programs.close_modal();
            }
        }
    }
}

impl eframe::App for DesktopGuiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();
        match self.view {
            ViewState::Login => self.show_login_screen(ctx),
            ViewState::Main => self.show_shell(ctx),
        }
        // keep polling the event queue while work is in flight
        ctx.request_repaint_after(std::time::Duration::from_millis(150));
    }
}

fn screen_label(screen: Screen) -> &'static str {
    match screen {
        Screen::Enrollments => "Inscripciones",
        Screen::Users => "Usuarios",
        Screen::Programs => "Programas",
    }
}

fn login_failure_message(err: &UiError) -> String {
    use crate::controller::events::UiErrorCategory;
    match err.category() {
        UiErrorCategory::Transport => {
            "No se pudo conectar con el servidor. Verifique su conexión.".to_string()
        }
        _ => err.message().to_string(),
    }
}

fn labeled_field(
    ui: &mut egui::Ui,
    label: &str,
    value: &mut String,
    error: &mut Option<String>,
) {
    ui.label(egui::RichText::new(label).strong());
    let resp = ui.add(egui::TextEdit::singleline(value).desired_width(f32::INFINITY));
    if resp.changed() {
        *error = None;
    }
    if let Some(message) = error {
        ui.colored_label(egui::Color32::LIGHT_RED, message.as_str());
    }
}

fn role_picker(ui: &mut egui::Ui, id: &str, rol: &mut Role) {
    ui.label(egui::RichText::new("Rol").strong());
    egui::ComboBox::from_id_source(id)
        .selected_text(rol.label())
        .show_ui(ui, |ui| {
            for candidate in Role::ALL {
                ui.selectable_value(rol, candidate, candidate.label());
            }
        });
}

fn show_profile_fields(ui: &mut egui::Ui, profile: &Profile) {
    egui::Grid::new("profile_fields")
        .num_columns(2)
        .spacing(egui::vec2(12.0, 4.0))
        .show(ui, |ui| {
            ui.strong("Delito");
            ui.label(&profile.delito);
            ui.end_row();
            ui.strong("Sentencia");
            ui.label(
                profile
                    .sentencia_anios
                    .map(|anios| format!("{anios} años"))
                    .unwrap_or_else(|| "—".to_string()),
            );
            ui.end_row();
            ui.strong("Establecimiento");
            ui.label(profile.establecimiento.as_deref().unwrap_or("—"));
            ui.end_row();
            ui.strong("Nivel educativo");
            ui.label(profile.nivel_educativo.as_deref().unwrap_or("—"));
            ui.end_row();
            ui.strong("Ocupación anterior");
            ui.label(profile.ocupacion_anterior.as_deref().unwrap_or("—"));
            ui.end_row();
            ui.strong("Fecha de ingreso");
            ui.label(profile.fecha_ingreso.format("%d/%m/%Y").to_string());
            ui.end_row();
            ui.strong("Fecha de salida");
            ui.label(
                profile
                    .fecha_salida
                    .map(|fecha| fecha.format("%d/%m/%Y").to_string())
                    .unwrap_or_else(|| "—".to_string()),
            );
            ui.end_row();
        });
}
