//! Decoding of the `multipart/form-data` bodies used by actor and movie writes.
//!
//! List fields arrive either as one JSON-encoded value (`genreIds=[1,3]`) or as
//! repeated scalar fields (`genreIds=1`, `genreIds=3`).

use std::collections::HashMap;

use axum::extract::Multipart;
use jiff::civil::Date;
use serde::de::DeserializeOwned;

use crate::{
    error::AppResult,
    relations::{CastInput, MovieLinks},
    storage::UploadedFile,
    validation::Validator,
};

pub const MAX_TITLE: usize = 300;
pub const MAX_ACTOR_NAME: usize = 150;
pub const MAX_CHARACTER: usize = 300;

/// Text fields keyed by lowercased name, plus any uploaded files.
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, Vec<String>>,
    files: HashMap<String, UploadedFile>,
}

impl FormData {
    pub async fn read(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = FormData::default();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(|n| n.to_ascii_lowercase()) else {
                continue;
            };

            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let bytes = field.bytes().await?;
                    // Browsers send an empty part when no file was picked.
                    if !bytes.is_empty() {
                        form.files.insert(name, UploadedFile { file_name, bytes });
                    }
                },
                None => {
                    let text = field.text().await?;
                    form.fields.entry(name).or_default().push(text);
                },
            }
        }

        Ok(form)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(|values| values.first()).map(String::as_str)
    }

    /// Trimmed text, `None` when absent or blank.
    pub fn optional_text(&self, name: &str) -> Option<String> {
        self.text(name).map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
    }

    /// A list field; `field` is the name reported back on a decoding error.
    pub fn list<T: DeserializeOwned>(
        &self,
        name: &str,
        field: &str,
        validator: &mut Validator,
    ) -> Vec<T> {
        let Some(values) = self.fields.get(name) else {
            return Vec::new();
        };

        let mut out = Vec::new();
        for raw in values.iter().map(|v| v.trim()).filter(|v| !v.is_empty()) {
            let parsed = if raw.starts_with('[') {
                serde_json::from_str::<Vec<T>>(raw)
            } else {
                serde_json::from_str::<T>(raw).map(|item| vec![item])
            };
            match parsed {
                Ok(items) => out.extend(items),
                Err(_) => {
                    validator.push(field, "the value provided is not valid for this field");
                    return Vec::new();
                },
            }
        }
        out
    }
}

#[derive(Clone, Debug)]
pub struct ActorForm {
    pub name: String,
    pub birth_date: Date,
    pub photo: Option<UploadedFile>,
}

impl ActorForm {
    pub fn parse(mut form: FormData) -> AppResult<Self> {
        let mut validator = Validator::new();

        let name = form.optional_text("name").unwrap_or_default();
        validator.name("name", &name, MAX_ACTOR_NAME);
        let birth_date = validator.date("birthDate", form.text("birthdate"));

        validator.finish()?;
        Ok(Self {
            name,
            birth_date: birth_date.unwrap_or_default(),
            photo: form.files.remove("photo"),
        })
    }
}

#[derive(Clone, Debug)]
pub struct MovieForm {
    pub title: String,
    pub trailer: Option<String>,
    pub release_date: Date,
    pub poster: Option<UploadedFile>,
    pub links: MovieLinks,
}

impl MovieForm {
    pub fn parse(mut form: FormData) -> AppResult<Self> {
        let mut validator = Validator::new();

        let title = form.optional_text("title").unwrap_or_default();
        validator.name("title", &title, MAX_TITLE);
        let trailer = form.optional_text("trailer");
        let release_date = validator.date("releaseDate", form.text("releasedate"));

        let genre_ids = form.list::<i32>("genreids", "genreIds", &mut validator);
        let cinema_ids = form.list::<i32>("cinemaids", "cinemaIds", &mut validator);
        let cast = form.list::<CastInput>("actors", "actors", &mut validator);
        for member in &cast {
            validator.max_len("actors", &member.character, MAX_CHARACTER);
        }

        validator.finish()?;
        Ok(Self {
            title,
            trailer,
            release_date: release_date.unwrap_or_default(),
            poster: form.files.remove("poster"),
            links: MovieLinks { genre_ids, cinema_ids, cast },
        })
    }
}
