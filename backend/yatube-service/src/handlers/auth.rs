/// Authentication handlers
use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::error::Result;
use crate::forms::{login_form_schema, LoginForm, SignupForm};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

pub async fn signup(
    state: web::Data<AppState>,
    form: web::Json<SignupForm>,
) -> Result<HttpResponse> {
    let response = state.users.signup(form.into_inner()).await?;
    Ok(HttpResponse::Created().json(response))
}

/// Login form; the target of login-required redirects
pub async fn login_form(query: web::Query<NextQuery>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "form": login_form_schema(query.next.as_deref()),
    }))
}

pub async fn login(
    state: web::Data<AppState>,
    form: web::Json<LoginForm>,
) -> Result<HttpResponse> {
    let response = state.users.login(form.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}
