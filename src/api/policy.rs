//! Central authorization policy.
//!
//! Every role-gated handler asks `require(user, action)` instead of
//! comparing role strings inline, so the whole access model lives in one
//! match. Ownership is part of the action where it matters.

use crate::db::{Lead, Listing, User, UserRole};

use super::error::ApiError;

#[derive(Debug, Clone, Copy)]
pub enum Action<'a> {
    CreateListing,
    EditListing(&'a Listing),
    DeleteListing(&'a Listing),
    /// Vendor-side lifecycle move (draft/rejected -> submitted)
    SubmitListing(&'a Listing),
    /// Admin decision on a submitted listing
    DecideListing,
    ViewVendorDashboard,
    ManageLead(&'a Lead),
    ModerateUsers,
    ViewAdminDashboard,
}

pub fn can(user: &User, action: Action<'_>) -> bool {
    match user.role() {
        UserRole::Admin => matches!(
            action,
            Action::DecideListing | Action::ModerateUsers | Action::ViewAdminDashboard
        ),
        UserRole::Vendor => match action {
            Action::CreateListing | Action::ViewVendorDashboard => true,
            Action::EditListing(listing)
            | Action::DeleteListing(listing)
            | Action::SubmitListing(listing) => listing.vendor_id == user.id,
            Action::ManageLead(lead) => lead.vendor_id == user.id,
            _ => false,
        },
        UserRole::Student => false,
    }
}

pub fn require(user: &User, action: Action<'_>) -> Result<(), ApiError> {
    if can(user, action) {
        return Ok(());
    }
    let message = match action {
        Action::CreateListing => "Only vendors can create listings",
        Action::EditListing(_) => "Not authorized to update this listing",
        Action::DeleteListing(_) => "Not authorized to delete this listing",
        Action::SubmitListing(_) => "Not authorized to submit this listing",
        Action::DecideListing => "Not authorized to moderate listings",
        Action::ViewVendorDashboard => "Not authorized as vendor",
        Action::ManageLead(_) => "Not authorized to manage this lead",
        Action::ModerateUsers => "Not authorized as an admin",
        Action::ViewAdminDashboard => "Not authorized as an admin",
    };
    Err(ApiError::forbidden(message))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, user_type: &str) -> User {
        User {
            id: id.to_string(),
            name: "Test".to_string(),
            email: format!("{}@example.com", id),
            password_hash: String::new(),
            phone: String::new(),
            user_type: user_type.to_string(),
            business_name: None,
            profile_image: None,
            is_active: true,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn listing(vendor_id: &str) -> Listing {
        Listing {
            id: "l1".to_string(),
            vendor_id: vendor_id.to_string(),
            title: String::new(),
            description: String::new(),
            category: "hostel".to_string(),
            location: String::new(),
            city: String::new(),
            address: None,
            price: 0.0,
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

    #[test]
    fn owner_vendor_can_edit_others_cannot() {
        let owner = user("v1", "vendor");
        let other = user("v2", "vendor");
        let student = user("s1", "student");
        let l = listing("v1");

        assert!(can(&owner, Action::EditListing(&l)));
        assert!(can(&owner, Action::DeleteListing(&l)));
        assert!(!can(&other, Action::EditListing(&l)));
        assert!(!can(&other, Action::DeleteListing(&l)));
        assert!(!can(&student, Action::EditListing(&l)));
    }

    #[test]
    fn only_admin_decides_and_moderates() {
        let admin = user("a1", "admin");
        let vendor = user("v1", "vendor");
        let student = user("s1", "student");

        assert!(can(&admin, Action::DecideListing));
        assert!(can(&admin, Action::ModerateUsers));
        assert!(!can(&vendor, Action::DecideListing));
        assert!(!can(&student, Action::DecideListing));
    }

    #[test]
    fn admin_does_not_edit_vendor_listings() {
        let admin = user("a1", "admin");
        let l = listing("v1");
        assert!(!can(&admin, Action::EditListing(&l)));
        assert!(!can(&admin, Action::CreateListing));
    }

    #[test]
    fn vendor_dashboard_gate() {
        assert!(can(&user("v1", "vendor"), Action::ViewVendorDashboard));
        assert!(!can(&user("s1", "student"), Action::ViewVendorDashboard));
        assert!(!can(&user("a1", "admin"), Action::ViewVendorDashboard));
    }

    #[test]
    fn require_returns_forbidden() {
        let student = user("s1", "student");
        let err = require(&student, Action::CreateListing).unwrap_err();
        assert_eq!(err.code(), crate::api::error::ErrorCode::Forbidden);
    }
}
