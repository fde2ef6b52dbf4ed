mod crop;
mod domain_repository;
mod entity;
mod errors;
mod journal;
mod records;
mod role;
mod summary;
mod user;
mod validation;

pub use crop::{Crop, CropFilter, CropInput, CropStatus};
pub use domain_repository::{CropRepository, CrudRepository, UserRepository};
pub use entity::{Entity, EntityFilter, EntityInput, Owner};
pub use errors::DomainError;
pub use journal::{FieldActivity, FieldActivityInput, FieldDocument, FieldDocumentInput, FieldTreatment,
                  FieldTreatmentInput, JournalFilter};
pub use records::{Irrigation, IrrigationInput, Production, ProductionInput, RecordFilter, SoilAnalysis,
                  SoilAnalysisInput};
pub use role::Role;
pub use summary::DeleteSummary;
pub use user::{normalize_email, validate_password, NewUser, NewUserRecord, User, UserChanges, UserCredentials,
               UserUpdate, MIN_PASSWORD_LEN};
pub use validation::Validate;
