//! Поиск фильмов по каталогу.
//!
//! Регистронезависимое вхождение подстроки в название или жанр. Пустой
//! запрос отдает весь каталог, отсутствие совпадений - пустой список, а не ошибку.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

use crate::catalog::Catalog;
use crate::models::Movie;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MovieQuery {
    #[serde(default)]
    pub query: Option<String>,
    /// Оставить только фильмы с сеансом в эту дату. Пустое значение = без фильтра.
    #[serde(default, deserialize_with = "blank_date_as_none")]
    pub date: Option<NaiveDate>,
}

impl MovieQuery {
    pub fn text(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            date: None,
        }
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }
}

fn blank_date_as_none<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<NaiveDate>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}

pub fn search_movies<'a>(catalog: &'a Catalog, query: &MovieQuery) -> Vec<&'a Movie> {
    let needle = query
        .query
        .as_deref()
        .map(prepare_search_query)
        .unwrap_or_default();

    // Быстрый путь: без текста и без даты
    if needle.is_empty() && query.date.is_none() {
        return catalog.movies().iter().collect();
    }

    let on_date = query.date.map(|d| catalog.movies_showing_on(d));

    catalog
        .movies()
        .iter()
        .filter(|movie| needle.is_empty() || matches_text(movie, &needle))
        .filter(|movie| on_date.as_ref().map_or(true, |ids| ids.contains(movie.id.as_str())))
        .collect()
}

fn matches_text(movie: &Movie, needle: &str) -> bool {
    prepare_search_query(&movie.title).contains(needle) || prepare_search_query(&movie.genre).contains(needle)
}

fn prepare_search_query(query: &str) -> String {
    query
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titles(movies: Vec<&Movie>) -> Vec<&str> {
        movies.into_iter().map(|m| m.title.as_str()).collect()
    }

    #[test]
    fn finds_by_title_case_insensitively() {
        let catalog = Catalog::demo();
        assert_eq!(titles(search_movies(&catalog, &MovieQuery::text("batman"))), vec!["The Batman"]);
        assert_eq!(titles(search_movies(&catalog, &MovieQuery::text("  DUNE:   part "))), vec!["Dune: Part Two"]);
    }

    #[test]
    fn finds_by_genre() {
        let catalog = Catalog::demo();
        assert_eq!(titles(search_movies(&catalog, &MovieQuery::text("sci-fi"))), vec!["Dune: Part Two"]);
    }

    #[test]
    fn no_match_is_empty_not_error() {
        let catalog = Catalog::demo();
        assert!(search_movies(&catalog, &MovieQuery::text("zzz")).is_empty());
    }

    #[test]
    fn blank_query_returns_everything() {
        let catalog = Catalog::demo();
        assert_eq!(search_movies(&catalog, &MovieQuery::text("   ")).len(), catalog.movies().len());
        assert_eq!(search_movies(&catalog, &MovieQuery::default()).len(), catalog.movies().len());
    }

    #[test]
    fn date_filter_keeps_movies_with_showings_that_day() {
        let catalog = Catalog::demo();
        let day = NaiveDate::from_ymd_opt(2026, 11, 21).unwrap();
        let found = titles(search_movies(&catalog, &MovieQuery::default().on(day)));
        assert_eq!(found, vec!["Inside Out 2", "Oppenheimer"]);

        let found = titles(search_movies(&catalog, &MovieQuery::text("batman").on(day)));
        assert!(found.is_empty());
    }

    #[test]
    fn blank_date_means_no_filter() {
        let query: MovieQuery = serde_json::from_value(serde_json::json!({"query": "", "date": ""})).unwrap();
        assert!(query.date.is_none());

        let query: MovieQuery = serde_json::from_value(serde_json::json!({"date": "2026-11-21"})).unwrap();
        assert_eq!(query.date, NaiveDate::from_ymd_opt(2026, 11, 21));

        assert!(serde_json::from_value::<MovieQuery>(serde_json::json!({"date": "21.11.2026"})).is_err());
    }
}
