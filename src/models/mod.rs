pub mod company;
pub mod debit;
pub mod document;
pub mod report;

pub use company::Company;
pub use debit::{DebitKey, DebitLine};
pub use document::{
    CancellationRequest, CancellationTarget, CompensationDeclaration, DocumentHeader,
    ExtractedDocument, RestitutionRequest,
};
pub use report::{CreditBalance, DebitReport, ImportReport};
