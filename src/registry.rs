//! Registro fijo de analizadores disponibles.

use crate::analysers::{Analyser, ExifAnalyser, OfficeAnalyser, PdfAnalyser, XmpAnalyser};

static BUILTIN: [&dyn Analyser; 4] = [&ExifAnalyser, &OfficeAnalyser, &PdfAnalyser, &XmpAnalyser];

/// Lista de analizadores en el orden en que se ejecutan.
#[derive(Clone, Copy)]
pub struct Registry {
    analysers: &'static [&'static dyn Analyser],
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Registry {
    /// EXIF, Office, PDF y XMP, en ese orden.
    pub fn builtin() -> Self {
        Self {
            analysers: &BUILTIN,
        }
    }

    /// Registro con una lista propia, ejecutada en el orden dado.
    pub fn from_analysers(analysers: &'static [&'static dyn Analyser]) -> Self {
        Self { analysers }
    }

    pub fn analysers(&self) -> &[&'static dyn Analyser] {
        self.analysers
    }

    pub fn get(&self, name: &str) -> Option<&'static dyn Analyser> {
        self.analysers
            .iter()
            .copied()
            .find(|analyser| analyser.name() == name)
    }

    /// Analizadores cuyo nombre aparece en `names`; los nombres desconocidos no seleccionan nada.
    pub fn select(&self, names: &[String]) -> Vec<&'static dyn Analyser> {
        self.analysers
            .iter()
            .copied()
            .filter(|analyser| names.iter().any(|name| name == analyser.name()))
            .collect()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.analysers.iter().map(|analyser| analyser.name()).collect()
    }
}
