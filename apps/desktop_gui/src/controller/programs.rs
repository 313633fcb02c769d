//! State for the program catalog screen: kind filter, create/edit modal,
//! and the same two-step delete confirmation as enrollments.

use shared::{
    domain::{Program, ProgramId, ProgramKind},
    protocol::NewProgram,
};
use tracing::warn;

use crate::controller::validation;

#[derive(Debug, Clone, PartialEq)]
pub struct ProgramForm {
    pub nombre: String,
    pub descripcion: String,
    pub tipo: ProgramKind,
}

impl ProgramForm {
    fn empty() -> Self {
        Self {
            nombre: String::new(),
            descripcion: String::new(),
            tipo: ProgramKind::Educativo,
        }
    }

    fn seeded_from(program: &Program) -> Self {
        Self {
            nombre: program.nombre.clone(),
            descripcion: program.descripcion.clone(),
            tipo: program.tipo,
        }
    }
}

pub struct ProgramModal {
    /// `None` for create, the target id for edit.
    pub id: Option<ProgramId>,
    pub form: ProgramForm,
    pub error: Option<String>,
}

pub struct ProgramsScreen {
    pub programs: Vec<Program>,
    pub search: String,
    pub tipo_filter: Option<ProgramKind>,
    pub modal: Option<ProgramModal>,
    pending_delete: Option<ProgramId>,
    pub banner: Option<String>,
    pub loading: bool,
    pub saving: bool,
    pub deleting: bool,
}

impl ProgramsScreen {
    pub fn new() -> Self {
        Self {
            programs: Vec::new(),
            search: String::new(),
            tipo_filter: None,
            modal: None,
            pending_delete: None,
            banner: None,
            loading: false,
            saving: false,
            deleting: false,
        }
    }

    pub fn begin_load(&mut self) {
        self.loading = true;
    }

    pub fn apply_loaded(&mut self, programs: Vec<Program>) {
        self.programs = programs;
        self.loading = false;
        self.banner = None;
    }

    pub fn apply_load_failed(&mut self, message: &str) {
        warn!(error = message, "program load failed");
        self.loading = false;
        self.banner = Some(format!("No se pudieron cargar los programas: {message}"));
    }

    pub fn visible_rows(&self) -> Vec<&Program> {
        let needle = self.search.trim().to_lowercase();
        self.programs
            .iter()
            .filter(|program| {
                needle.is_empty() || program.nombre.to_lowercase().contains(&needle)
            })
            .filter(|program| {
                self.tipo_filter
                    .map(|tipo| program.tipo == tipo)
                    .unwrap_or(true)
            })
            .collect()
    }

    pub fn open_create(&mut self) {
        self.modal = Some(ProgramModal {
            id: None,
            form: ProgramForm::empty(),
            error: None,
        });
    }

    pub fn open_edit(&mut self, program: &Program) {
        self.modal = Some(ProgramModal {
            id: Some(program.id.clone()),
            form: ProgramForm::seeded_from(program),
            error: None,
        });
    }

    pub fn close_modal(&mut self) {
        self.modal = None;
        self.saving = false;
    }

    /// Returns `(target, payload)` when the form is valid; the saved list is
    /// reloaded afterwards rather than merged optimistically, the catalog is
    /// small.
    pub fn submit(&mut self) -> Option<(Option<ProgramId>, NewProgram)> {
        let modal = self.modal.as_mut()?;
        if !validation::required(&modal.form.nombre) {
            modal.error = Some("El nombre del programa es obligatorio.".to_string());
            return None;
        }
        modal.error = None;
        self.saving = true;
        Some((
            modal.id.clone(),
            NewProgram {
                nombre: modal.form.nombre.trim().to_string(),
                descripcion: modal.form.descripcion.trim().to_string(),
                tipo: modal.form.tipo,
            },
        ))
    }

    pub fn apply_saved(&mut self) {
        self.saving = false;
        self.modal = None;
        self.banner = None;
    }

    pub fn apply_save_failed(&mut self, message: &str) {
        warn!(error = message, "program save failed");
        self.saving = false;
        self.banner = Some(format!("No se pudo guardar el programa: {message}"));
    }

    // ---- delete ----

    pub fn request_delete(&mut self, id: ProgramId) {
        self.pending_delete = Some(id);
    }

    pub fn pending_delete(&self) -> Option<&ProgramId> {
        self.pending_delete.as_ref()
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    pub fn confirm_delete(&mut self) -> Option<ProgramId> {
        let id = self.pending_delete.clone()?;
        self.deleting = true;
        Some(id)
    }

    pub fn apply_delete_result(&mut self, id: &ProgramId, result: Result<(), String>) {
        match result {
            Ok(()) => {
                self.deleting = false;
                self.pending_delete = None;
                self.programs.retain(|program| &program.id != id);
                self.banner = None;
            }
            Err(message) => self.apply_delete_failed(&message),
        }
    }

    /// Works without a pending id: the dialog may have been cancelled while
    /// the request was still in flight.
    pub fn apply_delete_failed(&mut self, message: &str) {
        warn!(error = message, "program delete failed");
        self.deleting = false;
        self.pending_delete = None;
        self.banner = Some(format!("No se pudo eliminar el programa: {message}"));
    }
}

impl Default for ProgramsScreen {
    fn default() -> Self {
        Self::new()
    }
}
