//! The `User` entity and the form used to create or edit one.

use serde::{Deserialize, Serialize};

use crate::{
    Fetchable, Identifiable, Insertable, ParamValue, RepoError, RepoResult, Updatable,
};

/// Image shown for users that were saved without one.
pub const DEFAULT_IMAGE_URL: &str =
    "https://www.freeiconspng.com/uploads/icon-user-blue-symbol-people-person-generic--public-domain--21.png";

/// A site user. `id` is `None` until the row has been stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub image_url: Option<String>,
}

impl User {
    /// An unsaved user. Blank image URLs are stored as NULL.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        image_url: Option<String>,
    ) -> Self {
        Self {
            id: None,
            first_name: first_name.into(),
            last_name: last_name.into(),
            image_url: normalize_image_url(image_url),
        }
    }

    /// The stored image, or [`DEFAULT_IMAGE_URL`].
    pub fn image_url(&self) -> &str {
        self.image_url.as_deref().unwrap_or(DEFAULT_IMAGE_URL)
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

fn normalize_image_url(url: Option<String>) -> Option<String> {
    url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty())
}

impl Fetchable for User {
    const TABLE: &'static str = "users";
    const SELECT_COLUMNS: &'static [&'static str] = &["id", "first_name", "last_name", "image_url"];
    const ORDER_BY: &'static str = "last_name, first_name, id";
}

impl Identifiable for User {
    type Key = i64;
    const ID_COLUMN: &'static str = "id";

    fn id(&self) -> Option<i64> {
        self.id
    }
}

impl Insertable for User {
    const INSERT_COLUMNS: &'static [&'static str] = &["first_name", "last_name", "image_url"];

    fn insert_values(&self) -> Vec<ParamValue> {
        vec![
            ParamValue::Text(self.first_name.clone()),
            ParamValue::Text(self.last_name.clone()),
            ParamValue::from(self.image_url.clone()),
        ]
    }
}

impl Updatable for User {
    const UPDATE_COLUMNS: &'static [&'static str] = &["first_name", "last_name", "image_url"];

    fn update_values(&self) -> RepoResult<Vec<ParamValue>> {
        let id = self.id.ok_or(RepoError::MissingId)?;
        let mut values = self.insert_values();
        values.push(ParamValue::Integer(id));
        Ok(values)
    }
}

/// Body of the new-user and edit-user forms.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct UserForm {
    pub first: String,
    pub last: String,
    #[serde(rename = "imgURL", default)]
    pub img_url: String,
}

impl UserForm {
    /// An unsaved user carrying the submitted fields.
    pub fn into_user(self) -> User {
        User::new(self.first, self.last, Some(self.img_url))
    }

    /// The submitted fields as the new state of user `id`.
    pub fn into_user_with_id(self, id: i64) -> User {
        User {
            id: Some(id),
            ..self.into_user()
        }
    }
}
