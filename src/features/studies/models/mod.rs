mod analysis;
mod patch;
mod questionnaire;
mod study;

pub use analysis::{AnalysisData, PerformanceYear, Ratio, RatioGroups, ReputationData};
pub use patch::{FieldPath, StudyFilter, StudyPatch};
pub use questionnaire::{
    Accionista, ClienteProveedor, DatosGenerales, Questionnaire, SolicitudCredito,
};
pub use study::{Study, StudyDocument, StudyStatus};
