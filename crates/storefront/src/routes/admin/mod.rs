//! Superuser admin panel.
//!
//! Users, categories and products share one set of generic handlers
//! parameterised by [`AdminResource`]. Every route requires a superuser;
//! anyone else logged in gets 403 before any form is parsed or any row
//! is read.

pub mod categories;
pub mod products;
pub mod resource;
pub mod users;

use std::collections::HashMap;
use std::marker::PhantomData;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{FromRequestParts, Path, Query, State},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::middleware::{AuthRejection, RequireAuth};
use crate::models::CurrentUser;
use crate::state::AppState;

pub use categories::Categories;
pub use products::Products;
pub use resource::{AdminResource, FieldErrors, FormMode, FormValues, SaveError};
pub use users::Users;

use resource::{FieldView, ListFilter, OptionView, TableColumn, TableRow};

/// Admin landing page.
pub const ADMIN_HOME: &str = "/admin/users/";

// =============================================================================
// Extractor
// =============================================================================

/// Extractor for a user allowed to manage resource `R`.
///
/// Anonymous requests are handled like [`RequireAuth`]; logged-in users
/// failing [`AdminResource::is_authorized`] get 403 Forbidden.
pub struct AdminActor<R>(pub CurrentUser, PhantomData<fn() -> R>);

impl<R, S> FromRequestParts<S> for AdminActor<R>
where
    R: AdminResource,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let RequireAuth(user) = RequireAuth::from_request_parts(parts, state).await?;

        if !R::is_authorized(&user) {
            tracing::warn!(
                user_id = %user.id,
                resource = R::SLUG,
                path = %parts.uri.path(),
                "Admin access denied"
            );
            return Err(AuthRejection::Forbidden);
        }

        Ok(Self(user, PhantomData))
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Layout data for every admin page.
pub struct AdminNav {
    pub user: CurrentUser,
    pub slug: &'static str,
    pub title: &'static str,
    pub singular: &'static str,
}

impl AdminNav {
    fn new<R: AdminResource>(user: CurrentUser) -> Self {
        Self {
            user,
            slug: R::SLUG,
            title: R::TITLE,
            singular: R::SINGULAR,
        }
    }

    /// List page of the current resource.
    #[must_use]
    pub fn list_url(&self) -> String {
        format!("/admin/{}/", self.slug)
    }
}

/// Filter dropdown above a list.
pub struct FilterView {
    pub key: &'static str,
    pub options: Vec<OptionView>,
}

/// Admin list page.
#[derive(Template, WebTemplate)]
#[template(path = "admin/list.html")]
pub struct ListTemplate {
    pub nav: AdminNav,
    pub columns: Vec<TableColumn>,
    pub rows: Vec<TableRow>,
    pub filter: Option<FilterView>,
}

/// Admin create/update form.
#[derive(Template, WebTemplate)]
#[template(path = "admin/form.html")]
pub struct FormTemplate {
    pub nav: AdminNav,
    pub heading: String,
    pub action: String,
    pub fields: Vec<FieldView>,
    pub has_errors: bool,
}

/// Admin soft-delete confirmation.
#[derive(Template, WebTemplate)]
#[template(path = "admin/delete.html")]
pub struct DeleteTemplate {
    pub nav: AdminNav,
    pub id: i32,
    pub name: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// Query parameters of a list page.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
}

/// List every row, including inactive ones.
pub async fn list<R: AdminResource>(
    AdminActor(user, _): AdminActor<R>,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse> {
    let filter = match R::LIST_FILTER {
        Some(_) => ListFilter::parse(query.category.as_deref()),
        None => ListFilter::default(),
    };
    let rows = R::list(state.pool(), &filter).await?;

    let filter = match R::LIST_FILTER {
        Some(key) => {
            let selected = filter.category.map(|c| c.to_string()).unwrap_or_default();
            let choices = R::choices(state.pool()).await?;
            Some(FilterView {
                key,
                options: OptionView::list(&choices, &selected),
            })
        }
        None => None,
    };

    Ok(ListTemplate {
        nav: AdminNav::new::<R>(user),
        columns: R::columns(),
        rows,
        filter,
    })
}

/// Blank create form.
pub async fn create_page<R: AdminResource>(
    AdminActor(user, _): AdminActor<R>,
    State(state): State<AppState>,
) -> Result<Response> {
    let fields = R::fields(FormMode::Create);
    let values = FormValues::defaults(&fields);

    render_form::<R>(&state, user, FormMode::Create, None, &values, &FieldErrors::default()).await
}

/// Create a row, or redisplay the form with errors.
pub async fn create<R: AdminResource>(
    AdminActor(user, _): AdminActor<R>,
    State(state): State<AppState>,
    Form(raw): Form<HashMap<String, String>>,
) -> Result<Response> {
    let values = FormValues::from(raw);

    match R::create(state.pool(), &values).await {
        Ok(id) => {
            tracing::info!(actor = %user.id, resource = R::SLUG, id, "Admin created row");
            Ok(Redirect::to(&format!("/admin/{}/", R::SLUG)).into_response())
        }
        Err(SaveError::Invalid(errors)) => {
            render_form::<R>(&state, user, FormMode::Create, None, &values, &errors).await
        }
        Err(e) => Err(save_failed(e)),
    }
}

/// Edit form filled from the stored row.
pub async fn update_page<R: AdminResource>(
    AdminActor(user, _): AdminActor<R>,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response> {
    let values = load_or_404::<R>(&state, id).await?;

    render_form::<R>(&state, user, FormMode::Update, Some(id), &values, &FieldErrors::default())
        .await
}

/// Update a row, or redisplay the form with errors.
pub async fn update<R: AdminResource>(
    AdminActor(user, _): AdminActor<R>,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Form(raw): Form<HashMap<String, String>>,
) -> Result<Response> {
    let values = FormValues::from(raw);

    match R::update(state.pool(), id, &values).await {
        Ok(()) => {
            tracing::info!(actor = %user.id, resource = R::SLUG, id, "Admin updated row");
            Ok(Redirect::to(&format!("/admin/{}/", R::SLUG)).into_response())
        }
        Err(SaveError::Invalid(errors)) => {
            render_form::<R>(&state, user, FormMode::Update, Some(id), &values, &errors).await
        }
        Err(e) => Err(save_failed(e)),
    }
}

/// Soft-delete confirmation page.
pub async fn delete_page<R: AdminResource>(
    AdminActor(user, _): AdminActor<R>,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    let values = load_or_404::<R>(&state, id).await?;

    Ok(DeleteTemplate {
        nav: AdminNav::new::<R>(user),
        id,
        name: R::display_name(&values),
    })
}

/// Deactivate a row. The row itself is kept.
pub async fn delete<R: AdminResource>(
    AdminActor(user, _): AdminActor<R>,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Redirect> {
    if !R::deactivate(state.pool(), id).await? {
        return Err(AppError::NotFound(format!("{} {id}", R::SINGULAR)));
    }

    tracing::info!(actor = %user.id, resource = R::SLUG, id, "Admin deactivated row");
    Ok(Redirect::to(&format!("/admin/{}/", R::SLUG)))
}

async fn load_or_404<R: AdminResource>(state: &AppState, id: i32) -> Result<FormValues> {
    R::load(state.pool(), id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} {id}", R::SINGULAR)))
}

/// Render the create or update form; 422 when showing errors.
async fn render_form<R: AdminResource>(
    state: &AppState,
    user: CurrentUser,
    mode: FormMode,
    id: Option<i32>,
    values: &FormValues,
    errors: &FieldErrors,
) -> Result<Response> {
    let choices = R::choices(state.pool()).await?;
    let fields = FieldView::build(&R::fields(mode), values, errors, &choices);

    let (heading, action) = match id {
        Some(id) => (
            format!("Edit {}", R::SINGULAR),
            format!("/admin/{}/{id}/update/", R::SLUG),
        ),
        None => (
            format!("New {}", R::SINGULAR),
            format!("/admin/{}/create/", R::SLUG),
        ),
    };

    let status = if errors.is_empty() {
        StatusCode::OK
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };

    Ok((
        status,
        FormTemplate {
            nav: AdminNav::new::<R>(user),
            heading,
            action,
            fields,
            has_errors: !errors.is_empty(),
        },
    )
        .into_response())
}

fn save_failed(err: SaveError) -> AppError {
    match err {
        SaveError::Repository(e) => AppError::Database(e),
        SaveError::PasswordHash => AppError::Internal("password hashing failed".to_string()),
        SaveError::Invalid(_) => AppError::BadRequest("invalid form".to_string()),
    }
}

// =============================================================================
// Routes
// =============================================================================

/// Routes for one resource under `/admin/{slug}/`.
pub fn resource_routes<R: AdminResource>() -> Router<AppState> {
    let base = format!("/admin/{}", R::SLUG);

    Router::new()
        .route(&format!("{base}/"), get(list::<R>))
        .route(
            &format!("{base}/create/"),
            get(create_page::<R>).post(create::<R>),
        )
        .route(
            &format!("{base}/{{id}}/update/"),
            get(update_page::<R>).post(update::<R>),
        )
        .route(
            &format!("{base}/{{id}}/delete/"),
            get(delete_page::<R>).post(delete::<R>),
        )
}

/// All admin routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin", get(|| async { Redirect::to(ADMIN_HOME) }))
        .route("/admin/", get(|| async { Redirect::to(ADMIN_HOME) }))
        .merge(resource_routes::<Users>())
        .merge(resource_routes::<Categories>())
        .merge(resource_routes::<Products>())
}
