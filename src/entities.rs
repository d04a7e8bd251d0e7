pub mod actor;
pub mod cinema;
pub mod genre;
pub mod movie;
pub mod movie_actor;
pub mod movie_cinema;
pub mod movie_genre;
pub mod user;
