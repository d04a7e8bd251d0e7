use jiff::{Timestamp, civil::Date};
use serde::{Deserialize, Serialize};

use crate::entities::{actor, cinema, genre, movie, movie_actor, user};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenreDto {
    pub id: i32,
    pub name: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct GenreInput {
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorDto {
    pub id: i32,
    pub name: String,
    pub birth_date: Option<Date>,
    pub photo: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CinemaDto {
    pub id: i32,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CinemaInput {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieDto {
    pub id: i32,
    pub title: String,
    pub trailer: Option<String>,
    pub release_date: Option<Date>,
    pub poster: Option<String>,
}

/// One cast entry of a movie, in display order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CastMemberDto {
    pub id: i32,
    pub name: String,
    pub photo: Option<String>,
    pub character: String,
    pub order: i32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieDetailDto {
    #[serde(flatten)]
    pub movie: MovieDto,
    pub genres: Vec<GenreDto>,
    pub cinemas: Vec<CinemaDto>,
    pub actors: Vec<CastMemberDto>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LandingPage {
    pub upcoming: Vec<MovieDto>,
    pub showing_now: Vec<MovieDto>,
}

/// Options needed to render an empty movie form.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MovieFormOptions {
    pub genres: Vec<GenreDto>,
    pub cinemas: Vec<CinemaDto>,
}

/// A movie as currently stored, plus the selectable complements for editing.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieEditForm {
    pub movie: MovieDto,
    pub selected_genres: Vec<GenreDto>,
    pub unselected_genres: Vec<GenreDto>,
    pub selected_cinemas: Vec<CinemaDto>,
    pub unselected_cinemas: Vec<CinemaDto>,
    pub actors: Vec<CastMemberDto>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: i32,
    pub email: String,
    pub is_admin: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub expiration: Timestamp,
}

#[derive(Clone, Debug, Deserialize)]
pub struct EditAdminRequest {
    pub email: String,
}

impl From<genre::Model> for GenreDto {
    fn from(model: genre::Model) -> Self {
        Self { id: model.id, name: model.name }
    }
}

impl From<actor::Model> for ActorDto {
    fn from(model: actor::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            birth_date: model.birth_date.parse().ok(),
            photo: model.photo,
        }
    }
}

impl From<cinema::Model> for CinemaDto {
    fn from(model: cinema::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            latitude: model.latitude,
            longitude: model.longitude,
        }
    }
}

impl From<movie::Model> for MovieDto {
    fn from(model: movie::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            trailer: model.trailer,
            release_date: model.release_date.parse().ok(),
            poster: model.poster,
        }
    }
}

impl From<user::Model> for UserDto {
    fn from(model: user::Model) -> Self {
        Self { id: model.id, email: model.email, is_admin: model.is_admin }
    }
}

impl CastMemberDto {
    pub fn new(link: movie_actor::Model, actor: actor::Model) -> Self {
        Self {
            id: actor.id,
            name: actor.name,
            photo: actor.photo,
            character: link.character,
            order: link.display_order,
        }
    }
}

/// Cast shape without a role, used by the actor name search.
impl From<actor::Model> for CastMemberDto {
    fn from(model: actor::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            photo: model.photo,
            character: String::new(),
            order: 0,
        }
    }
}
