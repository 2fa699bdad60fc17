use serde::{Deserialize, Serialize};

/// A row of the `artists` dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artist {
    pub artist_id: String,
    pub name: String,

    /// Free-text location. Empty strings in source data are stored as `None`.
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Artist {
    #[must_use]
    pub fn new(artist_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            artist_id: artist_id.into(),
            name: name.into(),
            location: None,
            latitude: None,
            longitude: None,
        }
    }

    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        let location = location.into();
        self.location = (!location.is_empty()).then_some(location);
        self
    }

    #[must_use]
    pub fn with_coordinates(mut self, latitude: Option<f64>, longitude: Option<f64>) -> Self {
        self.latitude = latitude;
        self.longitude = longitude;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artist_builder() {
        let artist = Artist::new("A1", "Miles Davis")
            .with_location("Alton, IL")
            .with_coordinates(Some(38.89), Some(-90.18));

        assert_eq!(artist.location.as_deref(), Some("Alton, IL"));
        assert_eq!(artist.latitude, Some(38.89));
        assert_eq!(artist.longitude, Some(-90.18));
    }

    #[test]
    fn test_empty_location_is_none() {
        let artist = Artist::new("A1", "N").with_location("");
        assert!(artist.location.is_none());
    }
}
