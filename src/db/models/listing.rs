//! Listing model, lifecycle states, and marketplace queries.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};

use super::common::{parse_address, parse_string_list, Address};
use super::user::VendorSummary;

/// Service categories offered on the marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Hostel,
    Pg,
    Coaching,
    Library,
    Mess,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Hostel => write!(f, "hostel"),
            Category::Pg => write!(f, "pg"),
            Category::Coaching => write!(f, "coaching"),
            Category::Library => write!(f, "library"),
            Category::Mess => write!(f, "mess"),
        }
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hostel" => Ok(Category::Hostel),
            "pg" => Ok(Category::Pg),
            "coaching" => Ok(Category::Coaching),
            "library" => Ok(Category::Library),
            "mess" => Ok(Category::Mess),
            _ => Err(format!("Unknown category: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Boys,
    Girls,
    Unisex,
}

impl Default for Gender {
    fn default() -> Self {
        Gender::Unisex
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Gender::Boys => write!(f, "boys"),
            Gender::Girls => write!(f, "girls"),
            Gender::Unisex => write!(f, "unisex"),
        }
    }
}

impl std::str::FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "boys" => Ok(Gender::Boys),
            "girls" => Ok(Gender::Girls),
            "unisex" => Ok(Gender::Unisex),
            _ => Err(format!("Unknown gender: {}", s)),
        }
    }
}

/// Moderation lifecycle for a listing.
///
/// draft -> submitted -> approved | rejected, and rejected -> submitted
/// (vendors may rework and resubmit a rejected listing).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Draft,
    Submitted,
    Approved,
    Rejected,
}

impl ListingStatus {
    /// Can the owning vendor move a listing from `self` to `requested`?
    /// Keeping the current status is always allowed; the only real vendor
    /// transitions are draft/rejected -> submitted.
    pub fn vendor_can_set(self, requested: ListingStatus) -> bool {
        if self == requested {
            return true;
        }
        matches!(
            (self, requested),
            (ListingStatus::Draft, ListingStatus::Submitted)
                | (ListingStatus::Rejected, ListingStatus::Submitted)
        )
    }

    /// Can an admin decide a listing currently in `self` as `requested`?
    pub fn admin_can_decide(self, requested: ListingStatus) -> bool {
        self == ListingStatus::Submitted
            && matches!(
                requested,
                ListingStatus::Approved | ListingStatus::Rejected
            )
    }
}

impl std::fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListingStatus::Draft => write!(f, "draft"),
            ListingStatus::Submitted => write!(f, "submitted"),
            ListingStatus::Approved => write!(f, "approved"),
            ListingStatus::Rejected => write!(f, "rejected"),
        }
    }
}

impl std::str::FromStr for ListingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(ListingStatus::Draft),
            "submitted" => Ok(ListingStatus::Submitted),
            "approved" => Ok(ListingStatus::Approved),
            "rejected" => Ok(ListingStatus::Rejected),
            _ => Err(format!("Unknown listing status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Listing {
    pub id: String,
    pub vendor_id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub location: String,
    pub city: String,
    /// JSON-encoded Address
    pub address: Option<String>,
    pub price: f64,
    pub rating: f64,
    pub reviews: i64,
    pub image: String,
    /// JSON-encoded string arrays
    pub images: Option<String>,
    pub videos: Option<String>,
    pub features: Option<String>,
    pub amenities: Option<String>,
    pub gender: String,
    pub status: String,
    pub views: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl Listing {
    pub fn status_enum(&self) -> ListingStatus {
        self.status.parse().unwrap_or(ListingStatus::Draft)
    }

    pub async fn find(db: &SqlitePool, id: &str) -> Result<Option<Listing>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM listings WHERE id = ?")
            .bind(id)
            .fetch_optional(db)
            .await
    }

    pub async fn insert(&self, db: &SqlitePool) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO listings (id, vendor_id, title, description, category, location,
                                  city, address, price, rating, reviews, image, images,
                                  videos, features, amenities, gender, status, views)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&self.id)
        .bind(&self.vendor_id)
        .bind(&self.title)
        .bind(&self.description)
        .bind(&self.category)
        .bind(&self.location)
        .bind(&self.city)
        .bind(&self.address)
        .bind(self.price)
        .bind(self.rating)
        .bind(self.reviews)
        .bind(&self.image)
        .bind(&self.images)
        .bind(&self.videos)
        .bind(&self.features)
        .bind(&self.amenities)
        .bind(&self.gender)
        .bind(&self.status)
        .bind(self.views)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Persist vendor-editable fields. The vendor reference, views counter,
    /// and rating/review aggregates are deliberately not part of this write.
    pub async fn update(&self, db: &SqlitePool) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE listings
            SET title = ?, description = ?, category = ?, location = ?, city = ?,
                address = ?, price = ?, image = ?, images = ?, videos = ?,
                features = ?, amenities = ?, gender = ?, status = ?,
                updated_at = datetime('now')
            WHERE id = ?
            "#,
        )
        .bind(&self.title)
        .bind(&self.description)
        .bind(&self.category)
        .bind(&self.location)
        .bind(&self.city)
        .bind(&self.address)
        .bind(self.price)
        .bind(&self.image)
        .bind(&self.images)
        .bind(&self.videos)
        .bind(&self.features)
        .bind(&self.amenities)
        .bind(&self.gender)
        .bind(&self.status)
        .bind(&self.id)
        .execute(db)
        .await?;
        Ok(())
    }

    pub async fn set_status(
        db: &SqlitePool,
        id: &str,
        status: ListingStatus,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE listings SET status = ?, updated_at = datetime('now') WHERE id = ?",
        )
        .bind(status.to_string())
        .bind(id)
        .execute(db)
        .await?;
        Ok(())
    }

    pub async fn delete(db: &SqlitePool, id: &str) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM listings WHERE id = ?")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }

    /// Single-statement increment so concurrent reads don't lose counts.
    pub async fn record_view(db: &SqlitePool, id: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE listings SET views = views + 1 WHERE id = ?")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }

    /// Public marketplace query. Every filter is optional; with no filters
    /// and no sort the result is in insertion order.
    pub async fn list(db: &SqlitePool, query: &ListingQuery) -> Result<Vec<Listing>, sqlx::Error> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM listings WHERE 1=1");

        if let Some(category) = &query.category {
            // "all" is the client's sentinel for no category filter
            if category != "all" {
                qb.push(" AND category = ").push_bind(category.clone());
            }
        }
        if let Some(city) = &query.city {
            if city != "All Cities" {
                qb.push(" AND city = ").push_bind(city.clone());
            }
        }
        if let Some(search) = &query.search {
            if !search.trim().is_empty() {
                let pattern = format!("%{}%", search.trim());
                qb.push(" AND (title LIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR location LIKE ")
                    .push_bind(pattern)
                    .push(")");
            }
        }
        if let Some(min_price) = query.min_price {
            qb.push(" AND price >= ").push_bind(min_price);
        }
        if let Some(max_price) = query.max_price {
            qb.push(" AND price <= ").push_bind(max_price);
        }

        // Unknown sort keys are a no-op, not an error
        match query.sort.as_deref() {
            Some("rating") => {
                qb.push(" ORDER BY rating DESC");
            }
            Some("price-low") => {
                qb.push(" ORDER BY price ASC");
            }
            Some("price-high") => {
                qb.push(" ORDER BY price DESC");
            }
            Some("reviews") => {
                qb.push(" ORDER BY reviews DESC");
            }
            _ => {}
        }

        qb.build_query_as().fetch_all(db).await
    }

    pub async fn list_for_vendor(
        db: &SqlitePool,
        vendor_id: &str,
    ) -> Result<Vec<Listing>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM listings WHERE vendor_id = ? ORDER BY created_at DESC")
            .bind(vendor_id)
            .fetch_all(db)
            .await
    }

    /// Admin moderation view, optionally narrowed to one lifecycle status.
    pub async fn list_with_status(
        db: &SqlitePool,
        status: Option<ListingStatus>,
    ) -> Result<Vec<Listing>, sqlx::Error> {
        match status {
            Some(s) => {
                sqlx::query_as(
                    "SELECT * FROM listings WHERE status = ? ORDER BY created_at DESC",
                )
                .bind(s.to_string())
                .fetch_all(db)
                .await
            }
            None => {
                sqlx::query_as("SELECT * FROM listings ORDER BY created_at DESC")
                    .fetch_all(db)
                    .await
            }
        }
    }
}

/// Query string for GET /api/listings.
#[derive(Debug, Default, Deserialize)]
pub struct ListingQuery {
    pub category: Option<String>,
    pub city: Option<String>,
    pub search: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub sort: Option<String>,
}

/// Listing as returned by the API, with JSON columns decoded.
#[derive(Debug, Clone, Serialize)]
pub struct ListingResponse {
    pub id: String,
    pub vendor_id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub location: String,
    pub city: String,
    pub address: Option<Address>,
    pub price: f64,
    pub rating: f64,
    pub reviews: i64,
    pub image: String,
    pub images: Vec<String>,
    pub videos: Vec<String>,
    pub features: Vec<String>,
    pub amenities: Vec<String>,
    pub gender: String,
    pub status: String,
    pub views: i64,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor: Option<VendorSummary>,
}

impl From<Listing> for ListingResponse {
    fn from(l: Listing) -> Self {
        Self {
            address: parse_address(l.address.as_deref()),
            images: parse_string_list(l.images.as_deref()),
            videos: parse_string_list(l.videos.as_deref()),
            features: parse_string_list(l.features.as_deref()),
            amenities: parse_string_list(l.amenities.as_deref()),
            id: l.id,
            vendor_id: l.vendor_id,
            title: l.title,
            description: l.description,
            category: l.category,
            location: l.location,
            city: l.city,
            price: l.price,
            rating: l.rating,
            reviews: l.reviews,
            image: l.image,
            gender: l.gender,
            status: l.status,
            views: l.views,
            created_at: l.created_at,
            updated_at: l.updated_at,
            vendor: None,
        }
    }
}

impl ListingResponse {
    pub fn with_vendor(mut self, vendor: Option<VendorSummary>) -> Self {
        self.vendor = vendor;
        self
    }
}

/// Partial update from the vendor dashboard. Absent fields keep their
/// current value; `status` is lifecycle-guarded in the handler.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateListingRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub city: Option<String>,
    pub address: Option<Address>,
    pub price: Option<f64>,
    pub image: Option<String>,
    pub images: Option<Vec<String>>,
    pub videos: Option<Vec<String>>,
    pub features: Option<Vec<String>>,
    pub amenities: Option<Vec<String>>,
    pub gender: Option<String>,
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(id: &str, vendor: &str) -> Listing {
        Listing {
            id: id.to_string(),
            vendor_id: vendor.to_string(),
            title: format!("Listing {}", id),
            description: String::new(),
            category: "hostel".to_string(),
            location: "Kothrud, Pune".to_string(),
            city: "Pune".to_string(),
            address: None,
            price: 8500.0,
            rating: 0.0,
            reviews: 0,
            image: String::new(),
            images: None,
            videos: None,
            features: None,
            amenities: None,
            gender: "unisex".to_string(),
            status: "draft".to_string(),
            views: 0,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    async fn seed_vendor(db: &sqlx::SqlitePool, id: &str) {
        sqlx::query(
            "INSERT INTO users (id, name, email, password_hash, user_type) VALUES (?, ?, ?, 'h', 'vendor')",
        )
        .bind(id)
        .bind(format!("Vendor {}", id))
        .bind(format!("{}@example.com", id))
        .execute(db)
        .await
        .unwrap();
    }

    #[test]
    fn vendor_transitions() {
        use ListingStatus::*;
        assert!(Draft.vendor_can_set(Submitted));
        assert!(Rejected.vendor_can_set(Submitted));
        assert!(Draft.vendor_can_set(Draft));
        assert!(!Draft.vendor_can_set(Approved));
        assert!(!Submitted.vendor_can_set(Approved));
        assert!(!Approved.vendor_can_set(Submitted));
        assert!(!Approved.vendor_can_set(Draft));
    }

    #[test]
    fn admin_decisions() {
        use ListingStatus::*;
        assert!(Submitted.admin_can_decide(Approved));
        assert!(Submitted.admin_can_decide(Rejected));
        assert!(!Submitted.admin_can_decide(Draft));
        assert!(!Draft.admin_can_decide(Approved));
        assert!(!Approved.admin_can_decide(Rejected));
    }

    #[test]
    fn status_parsing_is_strict() {
        assert!("published".parse::<ListingStatus>().is_err());
        assert_eq!(
            "Submitted".parse::<ListingStatus>().unwrap(),
            ListingStatus::Submitted
        );
    }

    #[tokio::test]
    async fn category_filter_and_unfiltered_list() {
        let db = crate::db::init_memory().await;
        seed_vendor(&db, "v1").await;

        let hostel = sample("l1", "v1");
        hostel.insert(&db).await.unwrap();
        let mut pg = sample("l2", "v1");
        pg.category = "pg".to_string();
        pg.insert(&db).await.unwrap();

        let all = Listing::list(&db, &ListingQuery::default()).await.unwrap();
        assert_eq!(all.len(), 2);
        // insertion order with no filters and no sort
        assert_eq!(all[0].id, "l1");

        let hostels = Listing::list(
            &db,
            &ListingQuery {
                category: Some("hostel".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(hostels.len(), 1);
        assert_eq!(hostels[0].category, "hostel");

        // "all" sentinel disables the filter
        let sentinel = Listing::list(
            &db,
            &ListingQuery {
                category: Some("all".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(sentinel.len(), 2);
    }

    #[tokio::test]
    async fn price_range_is_inclusive() {
        let db = crate::db::init_memory().await;
        seed_vendor(&db, "v1").await;

        for (id, price) in [("l1", 1000.0), ("l2", 2000.0), ("l3", 3000.0)] {
            let mut l = sample(id, "v1");
            l.price = price;
            l.insert(&db).await.unwrap();
        }

        let result = Listing::list(
            &db,
            &ListingQuery {
                min_price: Some(1000.0),
                max_price: Some(2000.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let ids: Vec<&str> = result.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["l1", "l2"]);
    }

    #[tokio::test]
    async fn search_matches_title_or_location() {
        let db = crate::db::init_memory().await;
        seed_vendor(&db, "v1").await;

        let mut a = sample("l1", "v1");
        a.title = "Sunrise Boys Hostel".to_string();
        a.location = "Kothrud, Pune".to_string();
        a.insert(&db).await.unwrap();

        let mut b = sample("l2", "v1");
        b.title = "Quiet Study Library".to_string();
        b.location = "Civil Lines, Jaipur".to_string();
        b.insert(&db).await.unwrap();

        let by_title = Listing::list(
            &db,
            &ListingQuery {
                search: Some("sunrise".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(by_title.len(), 1);
        assert_eq!(by_title[0].id, "l1");

        let by_location = Listing::list(
            &db,
            &ListingQuery {
                search: Some("jaipur".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(by_location.len(), 1);
        assert_eq!(by_location[0].id, "l2");
    }

    #[tokio::test]
    async fn sort_orders_and_unknown_sort_ignored() {
        let db = crate::db::init_memory().await;
        seed_vendor(&db, "v1").await;

        for (id, price, rating) in [("l1", 300.0, 4.1), ("l2", 100.0, 4.9), ("l3", 200.0, 3.2)] {
            let mut l = sample(id, "v1");
            l.price = price;
            l.rating = rating;
            l.insert(&db).await.unwrap();
        }

        let cheap_first = Listing::list(
            &db,
            &ListingQuery {
                sort: Some("price-low".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(cheap_first[0].id, "l2");
        assert_eq!(cheap_first[2].id, "l1");

        let top_rated = Listing::list(
            &db,
            &ListingQuery {
                sort: Some("rating".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(top_rated[0].id, "l2");

        let unknown = Listing::list(
            &db,
            &ListingQuery {
                sort: Some("alphabetical".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(unknown[0].id, "l1");
    }

    #[tokio::test]
    async fn delete_cascades_to_leads_and_likes() {
        let db = crate::db::init_memory().await;
        seed_vendor(&db, "v1").await;
        sample("l1", "v1").insert(&db).await.unwrap();

        sqlx::query(
            "INSERT INTO leads (id, listing_id, vendor_id, name, email, phone) VALUES ('lead1', 'l1', 'v1', 'N', 'n@example.com', '123')",
        )
        .execute(&db)
        .await
        .unwrap();
        sqlx::query("INSERT INTO likes (id, listing_id, user_id) VALUES ('like1', 'l1', 'v1')")
            .execute(&db)
            .await
            .unwrap();

        Listing::delete(&db, "l1").await.unwrap();

        let (leads,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM leads")
            .fetch_one(&db)
            .await
            .unwrap();
        let (likes,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM likes")
            .fetch_one(&db)
            .await
            .unwrap();
        assert_eq!(leads, 0);
        assert_eq!(likes, 0);
    }

    #[tokio::test]
    async fn update_never_touches_vendor_or_views() {
        let db = crate::db::init_memory().await;
        seed_vendor(&db, "v1").await;

        let listing = sample("l1", "v1");
        listing.insert(&db).await.unwrap();
        Listing::record_view(&db, "l1").await.unwrap();

        let mut edited = Listing::find(&db, "l1").await.unwrap().unwrap();
        edited.title = "Renamed".to_string();
        edited.vendor_id = "someone-else".to_string(); // must not be persisted
        edited.views = 0;
        edited.update(&db).await.unwrap();

        let stored = Listing::find(&db, "l1").await.unwrap().unwrap();
        assert_eq!(stored.title, "Renamed");
        assert_eq!(stored.vendor_id, "v1");
        assert_eq!(stored.views, 1);
    }
}
