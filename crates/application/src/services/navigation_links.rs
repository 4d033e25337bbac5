//! Navigation deep links
//!
//! Pure functions building links that open turn-by-turn navigation in
//! Waze or Google Maps (native app on mobile, browser on desktop).

use domain::value_objects::GeoPoint;

fn coords(point: &GeoPoint) -> String {
    format!("{:.6},{:.6}", point.latitude(), point.longitude())
}

/// Waze link that starts navigation to `destination` from the device's position
#[must_use]
pub fn waze_url(destination: &GeoPoint) -> String {
    format!("https://waze.com/ul?ll={}&navigate=yes", coords(destination))
}

/// Google Maps driving directions from `origin` to `destination`
#[must_use]
pub fn google_maps_url(origin: &GeoPoint, destination: &GeoPoint) -> String {
    format!(
        "https://www.google.com/maps/dir/?api=1&origin={}&destination={}&travelmode=driving",
        coords(origin),
        coords(destination)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waze_uses_destination_only() {
        assert_eq!(
            waze_url(&GeoPoint::rio_de_janeiro()),
            "https://waze.com/ul?ll=-22.906800,-43.172900&navigate=yes"
        );
    }

    #[test]
    fn google_maps_has_both_ends() {
        let url = google_maps_url(&GeoPoint::sao_paulo(), &GeoPoint::rio_de_janeiro());
        assert!(url.contains("origin=-23.550500,-46.633300"));
        assert!(url.contains("destination=-22.906800,-43.172900"));
        assert!(url.ends_with("travelmode=driving"));
    }
}
