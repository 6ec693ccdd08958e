mod document;
mod forms;
mod reset_token;
mod user;

pub use document::{Document, DocumentStatus};
pub use forms::{
    ForgotPasswordBody, LoginBody, RegisterBody, ResetPasswordBody, SetPaidQuery, SetStatusQuery,
};
pub use reset_token::PasswordResetToken;
pub use user::User;
