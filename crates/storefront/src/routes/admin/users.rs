//! User accounts in the admin panel.

use sqlx::PgPool;

use geekshop_core::{Email, UserId, Username};

use super::resource::{
    AdminResource, FieldErrors, FieldKind, FieldSpec, FormMode, FormValues, ListFilter,
    SaveError, TableColumn, TableRow, yes_no,
};
use crate::db::{RepositoryError, UserRepository};
use crate::models::user::{NewUser, UserChanges};
use crate::services::auth::{
    hash_password, parse_age, parse_first_name, parse_optional_email, validate_password,
};

/// Admin resource for `shop.users`.
pub struct Users;

/// Validated user form, before the password is hashed.
#[derive(Debug)]
struct UserForm {
    username: Username,
    email: Option<Email>,
    first_name: Option<String>,
    age: Option<i16>,
    password: Option<String>,
    is_active: bool,
    is_staff: bool,
    is_superuser: bool,
}

impl UserForm {
    /// Validate submitted values. A password is mandatory on create only.
    fn parse(values: &FormValues, mode: FormMode) -> Result<Self, SaveError> {
        let mut errors = FieldErrors::default();

        let username = Username::parse(values.get("username"))
            .map_err(|e| errors.add("username", e.to_string()))
            .ok();
        let email = parse_optional_email(values.get("email"))
            .map_err(|_| errors.add("email", "Enter a valid email address."))
            .ok()
            .flatten();
        let first_name = parse_first_name(values.get("first_name"))
            .map_err(|e| errors.add("first_name", e.to_string()))
            .ok()
            .flatten();
        let age = parse_age(values.get("age"))
            .map_err(|_| errors.add("age", "Enter a whole number between 0 and 150."))
            .ok()
            .flatten();

        let password = values.optional("password");
        match (&password, mode) {
            (None, FormMode::Create) => errors.add("password", "This field is required."),
            (Some(p), _) => {
                if let Err(e) = validate_password(p) {
                    errors.add("password", e.to_string());
                }
            }
            (None, FormMode::Update) => {}
        }

        let Some(username) = username else {
            return Err(SaveError::Invalid(errors));
        };

        errors.finish(|| Self {
            username,
            email,
            first_name,
            age,
            password,
            is_active: values.checkbox("is_active"),
            is_staff: values.checkbox("is_staff"),
            is_superuser: values.checkbox("is_superuser"),
        })
    }

    fn hashed_password(&self) -> Result<Option<String>, SaveError> {
        self.password
            .as_deref()
            .map(hash_password)
            .transpose()
            .map_err(|_| SaveError::PasswordHash)
    }
}

impl AdminResource for Users {
    const SLUG: &'static str = "users";
    const TITLE: &'static str = "Users";
    const SINGULAR: &'static str = "user";

    fn columns() -> Vec<TableColumn> {
        vec![
            TableColumn::new("username", "Username"),
            TableColumn::new("first_name", "Name"),
            TableColumn::new("email", "Email"),
            TableColumn::numeric("age", "Age"),
            TableColumn::new("is_staff", "Staff"),
            TableColumn::new("is_superuser", "Superuser"),
            TableColumn::new("is_active", "Active"),
        ]
    }

    fn fields(mode: FormMode) -> Vec<FieldSpec> {
        let password = FieldSpec::new("password", "Password", FieldKind::Password);
        let password = match mode {
            FormMode::Create => password.required(),
            FormMode::Update => password,
        };

        vec![
            FieldSpec::new("username", "Username", FieldKind::Text).required(),
            FieldSpec::new("first_name", "First name", FieldKind::Text),
            FieldSpec::new("email", "Email", FieldKind::Text),
            FieldSpec::new("age", "Age", FieldKind::Number),
            password,
            FieldSpec::new("is_active", "Active", FieldKind::Checkbox).checked(),
            FieldSpec::new("is_staff", "Staff", FieldKind::Checkbox),
            FieldSpec::new("is_superuser", "Superuser", FieldKind::Checkbox),
        ]
    }

    fn display_name(values: &FormValues) -> String {
        values.get("username").to_string()
    }

    async fn list(pool: &PgPool, _filter: &ListFilter) -> Result<Vec<TableRow>, RepositoryError> {
        let users = UserRepository::new(pool).list_for_admin().await?;

        Ok(users
            .into_iter()
            .map(|u| TableRow {
                id: u.id.as_i32(),
                cells: vec![
                    u.username.to_string(),
                    u.first_name.unwrap_or_default(),
                    u.email.map(|e| e.to_string()).unwrap_or_default(),
                    u.age.map(|a| a.to_string()).unwrap_or_default(),
                    yes_no(u.is_staff),
                    yes_no(u.is_superuser),
                    yes_no(u.is_active),
                ],
                is_active: u.is_active,
            })
            .collect())
    }

    async fn load(pool: &PgPool, id: i32) -> Result<Option<FormValues>, RepositoryError> {
        let user = UserRepository::new(pool).get_by_id(UserId::new(id)).await?;

        Ok(user.map(|u| {
            FormValues::from_pairs([
                ("username", u.username.to_string()),
                ("first_name", u.first_name.unwrap_or_default()),
                ("email", u.email.map(|e| e.to_string()).unwrap_or_default()),
                ("age", u.age.map(|a| a.to_string()).unwrap_or_default()),
                ("is_active", FormValues::flag(u.is_active).to_string()),
                ("is_staff", FormValues::flag(u.is_staff).to_string()),
                ("is_superuser", FormValues::flag(u.is_superuser).to_string()),
            ])
        }))
    }

    async fn create(pool: &PgPool, values: &FormValues) -> Result<i32, SaveError> {
        let form = UserForm::parse(values, FormMode::Create)?;
        let password_hash = form.hashed_password()?.unwrap_or_default();

        let user = UserRepository::new(pool)
            .create(&NewUser {
                username: form.username,
                email: form.email,
                first_name: form.first_name,
                age: form.age,
                password_hash,
                is_active: form.is_active,
                is_staff: form.is_staff,
                is_superuser: form.is_superuser,
            })
            .await
            .map_err(|e| SaveError::conflict_on(e, "username"))?;

        Ok(user.id.as_i32())
    }

    async fn update(pool: &PgPool, id: i32, values: &FormValues) -> Result<(), SaveError> {
        let form = UserForm::parse(values, FormMode::Update)?;
        let password_hash = form.hashed_password()?;

        UserRepository::new(pool)
            .update(
                UserId::new(id),
                &UserChanges {
                    username: form.username,
                    email: form.email,
                    first_name: form.first_name,
                    age: form.age,
                    password_hash,
                    is_active: form.is_active,
                    is_staff: form.is_staff,
                    is_superuser: form.is_superuser,
                },
            )
            .await
            .map_err(|e| SaveError::conflict_on(e, "username"))
    }

    async fn deactivate(pool: &PgPool, id: i32) -> Result<bool, RepositoryError> {
        UserRepository::new(pool).deactivate(UserId::new(id)).await
    }
}
