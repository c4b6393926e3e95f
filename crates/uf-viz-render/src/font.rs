use std::sync::{Arc, OnceLock};

use ab_glyph::FontVec;
use usvg::fontdb::{self, Database, Family, Query};

use crate::primitives::FontWeight;

/// Families tried, in order, for the generic `sans-serif` family.
const PREFERRED_SANS: &[&str] =
    &["DejaVu Sans", "Liberation Sans", "Noto Sans", "Helvetica", "Arial"];

static SYSTEM_FONTS: OnceLock<Arc<Database>> = OnceLock::new();

/// Process-wide system font database. Built on first use, read-only afterwards.
pub fn system_database() -> Arc<Database> {
    SYSTEM_FONTS
        .get_or_init(|| {
            let mut db = Database::new();
            db.load_system_fonts();
            if let Some(family) = sans_family(&db) {
                db.set_sans_serif_family(family);
            }
            tracing::debug!(faces = db.len(), "loaded system fonts");
            Arc::new(db)
        })
        .clone()
}

fn sans_family(db: &Database) -> Option<String> {
    let available: Vec<&str> = db
        .faces()
        .flat_map(|face| face.families.iter().map(|(name, _)| name.as_str()))
        .collect();
    PREFERRED_SANS
        .iter()
        .find(|name| available.contains(name))
        .map(|name| name.to_string())
        .or_else(|| available.first().map(|name| name.to_string()))
}

/// Fonts used for text measurement. Faces are `None` on hosts without fonts.
pub struct FontHandle {
    pub regular: Option<FontVec>,
    pub bold: Option<FontVec>,
}

impl FontHandle {
    pub fn system() -> Self {
        let db = system_database();
        Self {
            regular: load_face(&db, fontdb::Weight::NORMAL),
            bold: load_face(&db, fontdb::Weight::BOLD),
        }
    }

    /// A handle with no faces; measurement falls back to a width estimate.
    pub fn empty() -> Self {
        Self { regular: None, bold: None }
    }

    pub fn select(&self, weight: FontWeight) -> Option<&FontVec> {
        match weight {
            FontWeight::Bold => self.bold.as_ref().or(self.regular.as_ref()),
            FontWeight::Regular => self.regular.as_ref(),
        }
    }
}

fn load_face(db: &Database, weight: fontdb::Weight) -> Option<FontVec> {
    let query = Query { families: &[Family::SansSerif], weight, ..Query::default() };
    let id = db.query(&query)?;
    db.with_face_data(id, |data, index| FontVec::try_from_vec_and_index(data.to_vec(), index).ok())
        .flatten()
}
