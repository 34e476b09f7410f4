//! Public marketplace endpoints: browse, detail, likes, inquiries, and
//! listing creation (vendors, multipart).

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{
    parse_list_field, serialize_address, serialize_string_list, Address, Category,
    CreateLeadRequest, Gender, Lead, Like, Listing, ListingQuery, ListingResponse, ListingStatus,
    ToggleLikeRequest, ToggleLikeResponse, VendorSummary,
};
use crate::AppState;

use super::auth::CurrentUser;
use super::error::{ApiError, ValidationErrorBuilder};
use super::policy::{self, Action};
use super::uploads;
use super::validation::{
    validate_description, validate_email, validate_location, validate_name, validate_phone,
    validate_price, validate_title,
};

/// GET /api/listings — public browse with optional filters and sort.
pub async fn list_listings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListingQuery>,
) -> Result<Json<Vec<ListingResponse>>, ApiError> {
    let listings = Listing::list(&state.db, &query).await?;
    Ok(Json(listings.into_iter().map(ListingResponse::from).collect()))
}

/// GET /api/listings/:id — public detail with vendor summary; counts a view.
pub async fn get_listing(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ListingResponse>, ApiError> {
    let listing = Listing::find(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Listing not found"))?;

    Listing::record_view(&state.db, &id).await?;

    let vendor = VendorSummary::find(&state.db, &listing.vendor_id).await?;
    let mut response = ListingResponse::from(listing).with_vendor(vendor);
    response.views += 1; // reflect the view we just recorded

    Ok(Json(response))
}

/// Accumulated multipart form for listing creation.
#[derive(Default)]
struct CreateListingForm {
    title: String,
    description: String,
    category: String,
    location: String,
    city: String,
    address: Option<Address>,
    price: Option<f64>,
    gender: String,
    status: String,
    features: Vec<String>,
    amenities: Vec<String>,
    videos: Vec<String>,
    image: Option<String>,
    images: Vec<String>,
}

/// POST /api/listings — vendor only. Multipart with one `image` thumbnail,
/// up to `max_gallery_images` `images` files, and text fields.
pub async fn create_listing(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ListingResponse>), ApiError> {
    policy::require(&user, Action::CreateListing)?;

    let upload_dir = &state.config.uploads.dir;
    let max_gallery = state.config.uploads.max_gallery_images;
    let mut form = CreateListingForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                let file_name = field.file_name().unwrap_or("image").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read upload: {}", e)))?;
                form.image = Some(uploads::save_image(upload_dir, &file_name, &data).await?);
            }
            "images" => {
                if form.images.len() >= max_gallery {
                    return Err(ApiError::validation_field(
                        "images",
                        format!("At most {} gallery images are allowed", max_gallery),
                    ));
                }
                let file_name = field.file_name().unwrap_or("image").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read upload: {}", e)))?;
                form.images
                    .push(uploads::save_image(upload_dir, &file_name, &data).await?);
            }
            _ => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Malformed field: {}", e)))?;
                match name.as_str() {
                    "title" => form.title = value,
                    "description" => form.description = value,
                    "category" => form.category = value,
                    "location" => form.location = value,
                    "city" => form.city = value,
                    "address" => {
                        form.address = serde_json::from_str(&value).map_err(|_| {
                            ApiError::validation_field("address", "Address must be a JSON object")
                        })?;
                    }
                    "price" => {
                        form.price = Some(value.parse().map_err(|_| {
                            ApiError::validation_field("price", "Price must be a number")
                        })?);
                    }
                    "gender" => form.gender = value,
                    "status" => form.status = value,
                    "features" => form.features = parse_list_field(&value),
                    "amenities" => form.amenities = parse_list_field(&value),
                    "videos" => form.videos = parse_list_field(&value),
                    _ => {} // unknown fields are ignored
                }
            }
        }
    }

    let mut errors = ValidationErrorBuilder::new();
    if let Err(e) = validate_title(&form.title) {
        errors.add("title", e);
    }
    if let Err(e) = validate_description(&form.description) {
        errors.add("description", e);
    }
    if form.category.parse::<Category>().is_err() {
        errors.add(
            "category",
            "Category must be one of hostel, pg, coaching, library, mess",
        );
    }
    if let Err(e) = validate_location("Location", &form.location) {
        errors.add("location", e);
    }
    if let Err(e) = validate_location("City", &form.city) {
        errors.add("city", e);
    }
    match form.price {
        Some(price) => {
            if let Err(e) = validate_price(price) {
                errors.add("price", e);
            }
        }
        None => {
            errors.add("price", "Price is required");
        }
    }
    if form.image.is_none() {
        errors.add("image", "A thumbnail image is required");
    }
    let gender = if form.gender.is_empty() {
        Gender::default()
    } else {
        match form.gender.parse::<Gender>() {
            Ok(g) => g,
            Err(_) => {
                errors.add("gender", "Gender must be one of boys, girls, unisex");
                Gender::default()
            }
        }
    };
    let status = if form.status.is_empty() {
        ListingStatus::Draft
    } else {
        match form.status.parse::<ListingStatus>() {
            Ok(ListingStatus::Draft) => ListingStatus::Draft,
            Ok(ListingStatus::Submitted) => ListingStatus::Submitted,
            _ => {
                errors.add("status", "New listings start as 'draft' or 'submitted'");
                ListingStatus::Draft
            }
        }
    };
    errors.finish()?;

    let listing = Listing {
        id: Uuid::new_v4().to_string(),
        vendor_id: user.id.clone(),
        title: form.title.trim().to_string(),
        description: form.description,
        category: form.category.to_lowercase(),
        location: form.location,
        city: form.city,
        address: serialize_address(&form.address),
        price: form.price.unwrap_or(0.0),
        rating: 0.0,
        reviews: 0,
        image: form.image.unwrap_or_default(),
        images: serialize_string_list(&form.images),
        videos: serialize_string_list(&form.videos),
        features: serialize_string_list(&form.features),
        amenities: serialize_string_list(&form.amenities),
        gender: gender.to_string(),
        status: status.to_string(),
        views: 0,
        created_at: String::new(),
        updated_at: String::new(),
    };
    listing.insert(&state.db).await?;

    tracing::info!(listing_id = %listing.id, vendor_id = %user.id, status = %listing.status, "Created listing");

    let created = Listing::find(&state.db, &listing.id)
        .await?
        .ok_or_else(|| ApiError::internal("Listing vanished after creation"))?;

    Ok((StatusCode::CREATED, Json(ListingResponse::from(created))))
}

/// POST /api/listings/like — toggle the caller's favorite flag.
pub async fn toggle_like(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<ToggleLikeRequest>,
) -> Result<Json<ToggleLikeResponse>, ApiError> {
    if Listing::find(&state.db, &request.listing_id).await?.is_none() {
        return Err(ApiError::not_found("Listing not found"));
    }

    let liked = Like::toggle(&state.db, &request.listing_id, &user.id).await?;
    Ok(Json(ToggleLikeResponse {
        listing_id: request.listing_id,
        liked,
    }))
}

/// GET /api/listings/liked — ids of listings the caller currently likes.
pub async fn liked_listings(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<String>>, ApiError> {
    let ids = Like::liked_listing_ids(&state.db, &user.id).await?;
    Ok(Json(ids))
}

/// POST /api/listings/:id/leads — public inquiry form. When the caller is
/// logged in, the lead records who asked.
pub async fn create_lead(
    State(state): State<Arc<AppState>>,
    user: Option<CurrentUser>,
    Path(id): Path<String>,
    Json(request): Json<CreateLeadRequest>,
) -> Result<(StatusCode, Json<Lead>), ApiError> {
    let listing = Listing::find(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Listing not found"))?;

    let mut errors = ValidationErrorBuilder::new();
    if let Err(e) = validate_name(&request.name) {
        errors.add("name", e);
    }
    if let Err(e) = validate_email(&request.email) {
        errors.add("email", e);
    }
    if request.phone.is_empty() {
        errors.add("phone", "Phone is required");
    } else if let Err(e) = validate_phone(&request.phone) {
        errors.add("phone", e);
    }
    errors.finish()?;

    let lead = Lead {
        id: Uuid::new_v4().to_string(),
        listing_id: listing.id,
        vendor_id: listing.vendor_id,
        student_id: user.map(|CurrentUser(u)| u.id),
        name: request.name.trim().to_string(),
        email: request.email,
        phone: request.phone,
        message: request.message,
        status: "new".to_string(),
        created_at: String::new(),
    };
    lead.insert(&state.db).await?;

    let created = Lead::find(&state.db, &lead.id)
        .await?
        .ok_or_else(|| ApiError::internal("Lead vanished after creation"))?;

    Ok((StatusCode::CREATED, Json(created)))
}
