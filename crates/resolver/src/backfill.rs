//! Coordinate recovery for candidates geocoded at (0, 0).
//!
//! Sources, in order:
//! 1. The first box record of the candidate, when it has real coordinates
//! 2. The interpolation service, seeded with the street center
//! 3. The street center itself
//!
//! When no street center can be found the candidate stays at (0, 0).

use std::sync::Arc;

use tracing::debug;

use crate::errors::GeocodeError;
use crate::models::{Candidate, InterpolationRequest, Interpolated, Point, StructuredQuery};
use crate::provider::Geocoder;

pub struct CoordinateBackfill {
    geocoder: Arc<dyn Geocoder>,
}

impl CoordinateBackfill {
    pub fn new(geocoder: Arc<dyn Geocoder>) -> Self {
        Self { geocoder }
    }

    /// Replace the (0, 0) coordinates of `candidate`, if possible. The
    /// previous coordinates are kept in `geometry.coordinates_orig`.
    pub async fn backfill(&self, candidate: &mut Candidate) -> Result<(), GeocodeError> {
        if !candidate.has_zero_coordinates() {
            return Ok(());
        }

        debug!("Coordinates==0,0, check if any box number contains coordinates...");
        if let Some(point) = first_box_point(candidate) {
            debug!("Found coordinates in first box number");
            candidate.relocate(point, Interpolated::FromBoxNumber);
            return Ok(());
        }

        debug!("Coordinates==0,0, try to interpolate...");
        let Some(center) = self.street_center(candidate).await? else {
            debug!("No street center found, keep (0, 0)");
            return Ok(());
        };

        let (Some(street), number) = (candidate.street(), candidate.housenumber()) else {
            return Ok(());
        };
        let request = InterpolationRequest {
            lat: center.lat,
            lon: center.lon,
            number: number.unwrap_or_default().to_string(),
            street: street.to_string(),
        };

        let interpolated = self.geocoder.interpolate(&request).await?;
        debug!("Interpolate result: {:?}", interpolated);
        match interpolated.point() {
            Some(point) => candidate.relocate(point, Interpolated::Yes),
            None => candidate.relocate(center, Interpolated::StreetCenter),
        }
        Ok(())
    }

    /// Center of the candidate's street, restricted to its exact postal code.
    async fn street_center(&self, candidate: &Candidate) -> Result<Option<Point>, GeocodeError> {
        let (Some(street), Some(postalcode)) = (candidate.street(), candidate.postalcode()) else {
            debug!("No street or postalcode in candidate, cannot interpolate");
            return Ok(None);
        };

        let query = StructuredQuery {
            address: street.to_string(),
            locality: Some(String::new()),
            postalcode: Some(postalcode.to_string()),
        };
        let response = self.geocoder.geocode_structured(&query, None).await?;

        let center = response
            .features
            .iter()
            .find(|f| f.postalcode() == Some(postalcode))
            .map(Candidate::coordinates);
        debug!("street center: {:?}", center);
        Ok(center)
    }
}

fn first_box_point(candidate: &Candidate) -> Option<Point> {
    let first = candidate.best()?.box_info.first()?;
    let coordinates = first.coordinates?;
    (coordinates.lat != 0.0).then(|| coordinates.into())
}
