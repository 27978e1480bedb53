use dna_ladder::LadderCatalog;
use lazy_static::lazy_static;
use procedure::ProcedureCatalog;
use translations::Translations;

pub mod about;
pub mod curves;
pub mod dna_ladder;
pub mod engine;
pub mod engine_shell;
pub mod gel_render;
pub mod procedure;
pub mod report;
pub mod sampler;
pub mod sgrna;
pub mod translations;
pub mod workflow_examples;

lazy_static! {
    // Interface translations for the Professional and Kids display modes
    pub static ref TRANSLATIONS: Translations = Translations::default();

    // Procedure scripts: step lists, side-effect tables, metric distributions
    pub static ref PROCEDURES: ProcedureCatalog = ProcedureCatalog::default();

    // DNA ladders for gel rendering
    pub static ref DNA_LADDERS: LadderCatalog = LadderCatalog::default();
}
