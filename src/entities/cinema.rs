use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "cinemas")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::movie_cinema::Entity")]
    MovieCinema,
}

impl Related<super::movie_cinema::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MovieCinema.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
