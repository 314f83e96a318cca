#![allow(dead_code)]

use chrono::NaiveDateTime;
use diesel::dsl::max;
use diesel::prelude::*;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tempfile::TempDir;

use carwash_search::db::{
    ConnectionOptions, DbPool, establish_connection_pool, establish_connection_pool_with,
};
use carwash_search::models::listing::NewListing;
use carwash_search::models::media::{NewListingImage, NewReview};
use carwash_search::models::provider::NewProvider;
use carwash_search::schema::{listing_images, listings, providers, reviews};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub const SANTIAGO: (f64, f64) = (-33.4489, -70.6693);

/// A migrated SQLite file inside a temporary directory; both are removed on
/// drop.
pub struct TestDb {
    _dir: TempDir,
    url: String,
    pool: DbPool,
}

impl TestDb {
    pub fn new(name: &str) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let url = dir
            .path()
            .join(name)
            .to_str()
            .expect("utf-8 path")
            .to_string();

        let pool = establish_connection_pool_with(&url, ConnectionOptions::writable())
            .expect("create pool");
        let mut conn = pool.get().expect("get connection");
        conn.run_pending_migrations(MIGRATIONS)
            .expect("run migrations");

        Self {
            _dir: dir,
            url,
            pool,
        }
    }

    /// Writable pool used for seeding.
    pub fn pool(&self) -> DbPool {
        self.pool.clone()
    }

    /// The pool the server would use.
    pub fn read_only_pool(&self) -> DbPool {
        establish_connection_pool(&self.url).expect("create read-only pool")
    }

    pub fn provider(
        &self,
        name: &str,
        city: &str,
        region: &str,
        coordinates: Option<(f64, f64)>,
        rating: f64,
    ) -> i32 {
        self.insert_provider(&NewProvider {
            name,
            category: "carwash",
            street: "",
            city,
            region,
            latitude: coordinates.map(|c| c.0),
            longitude: coordinates.map(|c| c.1),
            is_verified: true,
            rating,
            review_count: 10,
        })
    }

    /// A Santiago provider `km` kilometres north of the city centre.
    pub fn provider_north_of_santiago(&self, name: &str, km: f64) -> i32 {
        self.provider(
            name,
            "Santiago",
            "Metropolitana",
            Some((SANTIAGO.0 + km / 111.195, SANTIAGO.1)),
            4.0,
        )
    }

    pub fn insert_provider(&self, provider: &NewProvider) -> i32 {
        let mut conn = self.pool.get().expect("get connection");
        diesel::insert_into(providers::table)
            .values(provider)
            .execute(&mut conn)
            .expect("insert provider");
        providers::table
            .select(max(providers::id))
            .first::<Option<i32>>(&mut conn)
            .expect("read provider id")
            .expect("provider id")
    }

    pub fn listing(&self, provider_id: i32, name: &str, category: &str, price: f64) -> i32 {
        self.insert_listing(&NewListing {
            provider_id,
            name,
            description: "",
            category,
            price,
            discounted_price: None,
            duration_minutes: 30,
            is_available: true,
            status: "active",
        })
    }

    pub fn insert_listing(&self, listing: &NewListing) -> i32 {
        let mut conn = self.pool.get().expect("get connection");
        diesel::insert_into(listings::table)
            .values(listing)
            .execute(&mut conn)
            .expect("insert listing");
        listings::table
            .select(max(listings::id))
            .first::<Option<i32>>(&mut conn)
            .expect("read listing id")
            .expect("listing id")
    }

    pub fn image(&self, listing_id: i32, url: &str, is_primary: bool, sort_order: i32) {
        let mut conn = self.pool.get().expect("get connection");
        diesel::insert_into(listing_images::table)
            .values(&NewListingImage {
                listing_id,
                url,
                alt_text: None,
                is_primary,
                sort_order,
            })
            .execute(&mut conn)
            .expect("insert image");
    }

    pub fn review(&self, listing_id: i32, author_name: &str, rating: i32, created_at: &str) {
        let created_at = NaiveDateTime::parse_from_str(created_at, "%Y-%m-%d %H:%M:%S")
            .expect("valid timestamp");
        let mut conn = self.pool.get().expect("get connection");
        diesel::insert_into(reviews::table)
            .values(&NewReview {
                listing_id,
                author_name,
                rating,
                comment: None,
                created_at,
            })
            .execute(&mut conn)
            .expect("insert review");
    }
}
