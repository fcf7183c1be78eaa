//! MovieLens `u.item` catalog loader.
//!
//! Rows are pipe-delimited, header-less and latin-1 encoded:
//! `movie_id|title|release_date|video_release_date|IMDb_URL|<19 genre flags>`

use std::{fs::File, io::Read, path::Path};

use crate::{
    error::{AppError, AppResult},
    models::{Catalog, Item, ItemId},
};

/// Genre flag columns, in file order
pub const GENRES: [&str; 19] = [
    "unknown",
    "Action",
    "Adventure",
    "Animation",
    "Children's",
    "Comedy",
    "Crime",
    "Documentary",
    "Drama",
    "Fantasy",
    "Film-Noir",
    "Horror",
    "Musical",
    "Mystery",
    "Romance",
    "Sci-Fi",
    "Thriller",
    "War",
    "Western",
];

const GENRE_OFFSET: usize = 5;
const FIELD_COUNT: usize = GENRE_OFFSET + GENRES.len();

/// Loads and validates the catalog file at `path`
pub fn load_catalog(path: impl AsRef<Path>) -> AppResult<Catalog> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let catalog = parse_catalog(file)?;

    tracing::info!(
        path = %path.display(),
        item_count = catalog.len(),
        "Loaded catalog"
    );

    Ok(catalog)
}

/// Parses `u.item` rows from any reader
pub fn parse_catalog<R: Read>(reader: R) -> AppResult<Catalog> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(b'|')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(reader);

    let mut items = Vec::new();
    for record in csv_reader.byte_records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        // Trailing blank lines come through as a single empty field
        if record.len() == 1 && record[0].is_empty() {
            continue;
        }
        if record.len() < FIELD_COUNT {
            return Err(AppError::Catalog(format!(
                "line {}: expected {} fields, found {}",
                line,
                FIELD_COUNT,
                record.len()
            )));
        }

        let id_field = latin1(&record[0]);
        let id: ItemId = id_field.trim().parse().map_err(|_| {
            AppError::Catalog(format!("line {}: invalid movie id {:?}", line, id_field))
        })?;

        let tags = GENRES
            .iter()
            .enumerate()
            .filter(|&(i, _)| record[GENRE_OFFSET + i].trim_ascii() == b"1")
            .map(|(_, genre)| *genre);

        let mut item = Item::new(id, latin1(&record[1]), tags);
        item.release_date = non_empty(latin1(&record[2]));
        item.imdb_url = non_empty(latin1(&record[4]));
        items.push(item);
    }

    Catalog::new(items)
}

/// Latin-1 maps each byte straight to the code point of the same value
fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
