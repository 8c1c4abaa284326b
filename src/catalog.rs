//! Каталог фильмов и сеансов.
//!
//! Каталог неизменяем после загрузки: все проверки (уникальность id, ссылки
//! сеансов на фильмы, непустая рассадка) выполняются в [`Catalog::new`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::error::{CatalogError, Resource};
use crate::models::{Movie, Showing};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "CatalogFile")]
pub struct Catalog {
    movies: Vec<Movie>,
    showings: Vec<Showing>,
    #[serde(skip)]
    movie_index: HashMap<String, usize>,
    #[serde(skip)]
    showing_index: HashMap<String, usize>,
}

// Сырой формат файла каталога, до валидации
#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    movies: Vec<Movie>,
    #[serde(default)]
    showings: Vec<Showing>,
}

impl TryFrom<CatalogFile> for Catalog {
    type Error = CatalogError;

    fn try_from(file: CatalogFile) -> Result<Self, Self::Error> {
        Catalog::new(file.movies, file.showings)
    }
}

impl Catalog {
    pub fn new(movies: Vec<Movie>, showings: Vec<Showing>) -> Result<Self, CatalogError> {
        let mut movie_index = HashMap::with_capacity(movies.len());
        for (i, movie) in movies.iter().enumerate() {
            if movie.id.trim().is_empty() {
                return Err(CatalogError::BlankId { resource: Resource::Movie });
            }
            if movie_index.insert(movie.id.clone(), i).is_some() {
                return Err(CatalogError::Duplicate {
                    resource: Resource::Movie,
                    id: movie.id.clone(),
                });
            }
        }

        let mut showing_index = HashMap::with_capacity(showings.len());
        for (i, showing) in showings.iter().enumerate() {
            if showing.id.trim().is_empty() {
                return Err(CatalogError::BlankId { resource: Resource::Showing });
            }
            if !movie_index.contains_key(&showing.movie_id) {
                return Err(CatalogError::UnknownMovie {
                    showing_id: showing.id.clone(),
                    movie_id: showing.movie_id.clone(),
                });
            }
            if showing.rows == 0 || showing.seats_per_row == 0 {
                return Err(CatalogError::EmptyLayout {
                    showing_id: showing.id.clone(),
                });
            }
            if showing_index.insert(showing.id.clone(), i).is_some() {
                return Err(CatalogError::Duplicate {
                    resource: Resource::Showing,
                    id: showing.id.clone(),
                });
            }
        }

        Ok(Self {
            movies,
            showings,
            movie_index,
            showing_index,
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(json)?)
    }

    pub async fn from_json_file(path: &Path) -> Result<Self, CatalogError> {
        let data = tokio::fs::read_to_string(path).await.map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&data)
    }

    pub fn movies(&self) -> &[Movie] {
        &self.movies
    }

    pub fn showings(&self) -> &[Showing] {
        &self.showings
    }

    pub fn movie(&self, id: &str) -> Option<&Movie> {
        self.movie_index.get(id).map(|&i| &self.movies[i])
    }

    pub fn showing(&self, id: &str) -> Option<&Showing> {
        self.showing_index.get(id).map(|&i| &self.showings[i])
    }

    /// Сеансы фильма, отсортированные по времени начала.
    pub fn showings_of(&self, movie_id: &str) -> Vec<&Showing> {
        let mut showings: Vec<&Showing> = self
            .showings
            .iter()
            .filter(|s| s.movie_id == movie_id)
            .collect();
        showings.sort_by(|a, b| a.starts_at.cmp(&b.starts_at).then_with(|| a.id.cmp(&b.id)));
        showings
    }

    /// Id фильмов, у которых есть сеанс в указанную дату.
    pub fn movies_showing_on(&self, date: NaiveDate) -> HashSet<&str> {
        self.showings
            .iter()
            .filter(|s| s.starts_at.date() == date)
            .map(|s| s.movie_id.as_str())
            .collect()
    }

    /// Демо-каталог для запуска без файла каталога и без базы.
    /// Рассадка 5 рядов по 10 мест.
    pub fn demo() -> Self {
        let movies = vec![
            Movie::new("the-batman", "The Batman", "Action", 176)
                .with_description("Batman ventures into Gotham City's underworld."),
            Movie::new("dune-part-two", "Dune: Part Two", "Sci-Fi", 166),
            Movie::new("inside-out-2", "Inside Out 2", "Animation", 96),
            Movie::new("oppenheimer", "Oppenheimer", "Drama", 180),
        ];

        let day = |d: u32, h: u32, m: u32| {
            NaiveDate::from_ymd_opt(2026, 11, d).and_then(|date| date.and_hms_opt(h, m, 0))
        };
        let plan = [
            ("batman-1", "the-batman", day(20, 18, 0), "Hall 1"),
            ("batman-2", "the-batman", day(20, 21, 30), "Hall 1"),
            ("dune-1", "dune-part-two", day(20, 19, 0), "Hall 2"),
            ("inside-out-1", "inside-out-2", day(21, 12, 0), "Hall 3"),
            ("oppenheimer-1", "oppenheimer", day(21, 20, 0), "Hall 2"),
        ];
        let showings = plan
            .into_iter()
            .filter_map(|(id, movie_id, starts_at, auditorium)| {
                Some(Showing {
                    id: id.to_string(),
                    movie_id: movie_id.to_string(),
                    starts_at: starts_at?,
                    auditorium: auditorium.to_string(),
                    rows: 5,
                    seats_per_row: 10,
                })
            })
            .collect();

        Self::new(movies, showings).unwrap_or_else(|e| {
            tracing::error!("demo catalog is invalid: {}", e);
            Self::empty()
        })
    }

    pub fn empty() -> Self {
        Self {
            movies: Vec::new(),
            showings: Vec::new(),
            movie_index: HashMap::new(),
            showing_index: HashMap::new(),
        }
    }
}
