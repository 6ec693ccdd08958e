use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordBody {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordBody {
    pub token: String,
    pub new_password: String,
}

// Admin mutations take their arguments as query parameters; deployed admin
// tooling depends on that shape.
#[derive(Debug, Deserialize)]
pub struct SetPaidQuery {
    pub is_paid: bool,
}

#[derive(Debug, Deserialize)]
pub struct SetStatusQuery {
    pub status: String,
    pub review_notes: Option<String>,
}
