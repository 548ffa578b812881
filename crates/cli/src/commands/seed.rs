//! Sample catalogue for development databases.
//!
//! Paintings go through the same validation as the admin API. Seeding is
//! skipped when the catalogue is not empty unless `--force` is given.

use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

use canvas_gallery_storefront::db::{PgStore, RepositoryError, Store};
use canvas_gallery_storefront::models::PaintingDraft;
use canvas_gallery_storefront::services::admin::{AdminError, AdminService};

use super::{CommandError, connect};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("Failed to seed '{title}': {source}")]
    Painting {
        title: &'static str,
        #[source]
        source: AdminError,
    },

    #[error("Invalid sample price for '{0}'")]
    Price(&'static str),
}

/// One sample painting: title, artist, medium, height x width in cm, year,
/// price in INR, stock.
struct Sample {
    title: &'static str,
    artist: &'static str,
    medium: &'static str,
    size_cm: (i64, i64),
    year: i32,
    price: &'static str,
    stock: i32,
}

const SAMPLES: &[Sample] = &[
    Sample {
        title: "Monsoon over the Western Ghats",
        artist: "Anjali Rao",
        medium: "Oil on canvas",
        size_cm: (90, 120),
        year: 2022,
        price: "48500.00",
        stock: 1,
    },
    Sample {
        title: "Lotus Pond at Noon",
        artist: "Ravi Menon",
        medium: "Oil on linen",
        size_cm: (60, 60),
        year: 2021,
        price: "27500.50",
        stock: 2,
    },
    Sample {
        title: "Harbour Lights, Kochi",
        artist: "Ravi Menon",
        medium: "Oil on board",
        size_cm: (40, 50),
        year: 2023,
        price: "15000.00",
        stock: 3,
    },
    Sample {
        title: "Marketplace in Jaipur",
        artist: "Farah Siddiqui",
        medium: "Oil on canvas",
        size_cm: (75, 100),
        year: 2020,
        price: "62000.00",
        stock: 1,
    },
    Sample {
        title: "Tea Gardens after Rain",
        artist: "Tenzing Bhutia",
        medium: "Oil and palette knife on canvas",
        size_cm: (50, 70),
        year: 2024,
        price: "21000.00",
        stock: 4,
    },
    Sample {
        title: "Study of a Brass Lamp",
        artist: "Anjali Rao",
        medium: "Oil on paper",
        size_cm: (30, 30),
        year: 2019,
        price: "6500.00",
        stock: 5,
    },
];

fn draft(sample: &Sample) -> Result<PaintingDraft, SeedError> {
    let (height, width) = sample.size_cm;
    Ok(PaintingDraft {
        title: sample.title.to_owned(),
        artist_name: sample.artist.to_owned(),
        description: Some(format!("{} by {}.", sample.medium, sample.artist)),
        medium: Some(sample.medium.to_owned()),
        height_cm: Some(Decimal::from(height)),
        width_cm: Some(Decimal::from(width)),
        depth_cm: None,
        year_created: Some(sample.year),
        price: Decimal::from_str(sample.price).map_err(|_| SeedError::Price(sample.title))?,
        stock_quantity: sample.stock,
        is_available: true,
    })
}

/// Insert the sample paintings.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a painting is rejected.
pub async fn paintings(force: bool) -> Result<(), SeedError> {
    let store = PgStore::new(connect().await?);

    let existing = {
        let mut uow = store.begin().await?;
        uow.painting_stats().await?.total_paintings
    };
    if existing > 0 && !force {
        tracing::warn!(existing, "Catalogue is not empty, skipping (use --force to seed anyway)");
        return Ok(());
    }

    let admin = AdminService::new(&store);
    for sample in SAMPLES {
        let painting = admin
            .create_painting(&draft(sample)?)
            .await
            .map_err(|source| SeedError::Painting {
                title: sample.title,
                source,
            })?;
        tracing::info!(painting_id = %painting.id, title = sample.title, "Seeded painting");
    }

    tracing::info!(count = SAMPLES.len(), "Seeding complete!");
    Ok(())
}
