use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Coarse genre families used by the stats widget.
///
/// Declaration order is matching order: the first family with a keyword
/// contained in a provider genre wins, so "pop rap" lands in [`Rap`] and
/// "pop punk" in [`Rock`].
///
/// [`Rap`]: GenreBucket::Rap
/// [`Rock`]: GenreBucket::Rock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenreBucket {
    Rap,
    Metal,
    Rock,
    Electronic,
    Rnb,
    Jazz,
    Classical,
    Folk,
    Latin,
    Pop,
    Other,
}

impl GenreBucket {
    pub const MATCHABLE: [GenreBucket; 10] = [
        GenreBucket::Rap,
        GenreBucket::Metal,
        GenreBucket::Rock,
        GenreBucket::Electronic,
        GenreBucket::Rnb,
        GenreBucket::Jazz,
        GenreBucket::Classical,
        GenreBucket::Folk,
        GenreBucket::Latin,
        GenreBucket::Pop,
    ];

    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            GenreBucket::Rap => &["rap", "hip hop", "hip-hop", "trap", "drill", "grime"],
            GenreBucket::Metal => &["metal", "deathcore", "djent", "thrash"],
            GenreBucket::Rock => &["rock", "punk", "grunge", "shoegaze", "emo"],
            GenreBucket::Electronic => &[
                "electro", "edm", "house", "techno", "trance", "dubstep", "drum and bass",
                "synthwave", "ambient",
            ],
            GenreBucket::Rnb => &["r&b", "rnb", "soul", "funk"],
            GenreBucket::Jazz => &["jazz", "bebop", "swing", "bossa nova"],
            GenreBucket::Classical => &["classical", "orchestra", "baroque", "opera", "soundtrack"],
            GenreBucket::Folk => &[
                "folk",
                "country",
                "bluegrass",
                "americana",
                "singer-songwriter",
            ],
            GenreBucket::Latin => &["latin", "reggaeton", "salsa", "bachata", "cumbia"],
            GenreBucket::Pop => &["pop", "chanson", "variete"],
            GenreBucket::Other => &[],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GenreBucket::Rap => "Rap / Hip-hop",
            GenreBucket::Metal => "Metal",
            GenreBucket::Rock => "Rock",
            GenreBucket::Electronic => "Electronic",
            GenreBucket::Rnb => "R&B / Soul",
            GenreBucket::Jazz => "Jazz",
            GenreBucket::Classical => "Classical",
            GenreBucket::Folk => "Folk / Country",
            GenreBucket::Latin => "Latin",
            GenreBucket::Pop => "Pop",
            GenreBucket::Other => "Other",
        }
    }
}

impl fmt::Display for GenreBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Maps a provider genre string ("french hip hop", "indie pop") to a family.
pub fn classify(genre: &str) -> GenreBucket {
    let genre = genre.to_lowercase();
    GenreBucket::MATCHABLE
        .into_iter()
        .find(|bucket| {
            bucket
                .keywords()
                .iter()
                .any(|keyword| genre.contains(keyword))
        })
        .unwrap_or(GenreBucket::Other)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenreCount {
    pub genre: GenreBucket,
    pub label: String,
    /// Number of artists with at least one genre in this family.
    pub count: usize,
}

/// Counts genre families across a top-artists payload.
///
/// Accepts either the provider's paging object (`{"items": [...]}`) or a bare
/// array of artists. An artist counts once per family however many of its
/// genres fall into it; artists without genres are ignored.
pub fn summarize(artists: &Value) -> Vec<GenreCount> {
    let items = artists
        .get("items")
        .and_then(Value::as_array)
        .or_else(|| artists.as_array());
    let Some(items) = items else {
        return Vec::new();
    };

    let mut counts: BTreeMap<GenreBucket, usize> = BTreeMap::new();
    for artist in items {
        let Some(genres) = artist.get("genres").and_then(Value::as_array) else {
            continue;
        };
        let mut buckets: Vec<GenreBucket> = genres
            .iter()
            .filter_map(Value::as_str)
            .map(classify)
            .collect();
        buckets.sort();
        buckets.dedup();
        for bucket in buckets {
            *counts.entry(bucket).or_default() += 1;
        }
    }

    let mut summary: Vec<GenreCount> = counts
        .into_iter()
        .map(|(genre, count)| GenreCount {
            genre,
            label: genre.label().to_string(),
            count,
        })
        .collect();
    summary.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    summary
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn classifies_by_first_matching_family() {
        assert_eq!(classify("French Hip Hop"), GenreBucket::Rap);
        assert_eq!(classify("pop rap"), GenreBucket::Rap);
        assert_eq!(classify("pop punk"), GenreBucket::Rock);
        assert_eq!(classify("alternative metal"), GenreBucket::Metal);
        assert_eq!(classify("electropop"), GenreBucket::Electronic);
        assert_eq!(classify("indie pop"), GenreBucket::Pop);
        assert_eq!(classify("neo soul"), GenreBucket::Rnb);
        assert_eq!(classify("gregorian chant"), GenreBucket::Other);
    }

    #[test]
    fn summarizes_paging_objects() {
        let payload = json!({
            "items": [
                { "name": "A", "genres": ["french hip hop", "pop rap"] },
                { "name": "B", "genres": ["indie pop", "modern rock"] },
                { "name": "C", "genres": ["rap"] },
                { "name": "D", "genres": [] },
                { "name": "E" }
            ]
        });

        let summary = summarize(&payload);

        assert_eq!(
            summary
                .iter()
                .map(|entry| (entry.genre, entry.count))
                .collect::<Vec<_>>(),
            vec![
                (GenreBucket::Rap, 2),
                (GenreBucket::Pop, 1),
                (GenreBucket::Rock, 1),
            ]
        );
        assert_eq!(summary[0].label, "Rap / Hip-hop");
    }

    #[test]
    fn accepts_bare_arrays_and_ignores_garbage() {
        let payload = json!([{ "genres": ["jazz", 42] }]);
        assert_eq!(summarize(&payload)[0].genre, GenreBucket::Jazz);
        assert!(summarize(&json!({ "error": "nope" })).is_empty());
    }
}
