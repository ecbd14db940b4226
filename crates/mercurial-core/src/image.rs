use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// A raw image payload as received from the admin form: bytes plus the
/// media type the browser declared for them. No content sniffing happens
/// anywhere downstream; the declared type is authoritative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub media_type: String,
}

impl ImageUpload {
    #[must_use]
    pub fn new(bytes: Vec<u8>, media_type: impl Into<String>) -> Self {
        Self {
            bytes,
            media_type: media_type.into(),
        }
    }

    /// Parse a `data:` URI of the form `data:<media type>[;base64],<payload>`.
    ///
    /// Returns `None` when the scheme, the comma separator, or the base64
    /// payload is malformed. Non-base64 payloads are taken as literal bytes.
    #[must_use]
    pub fn from_data_uri(uri: &str) -> Option<Self> {
        let rest = uri.strip_prefix("data:")?;
        let (header, payload) = rest.split_once(',')?;
        let media_type = header.split(';').next().unwrap_or_default().to_string();
        let bytes = if header.ends_with(";base64") {
            BASE64.decode(payload).ok()?
        } else {
            payload.as_bytes().to_vec()
        };
        Some(Self { bytes, media_type })
    }

    /// Re-encode the payload as a self-contained `data:` URI.
    #[must_use]
    pub fn to_data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.media_type,
            BASE64.encode(&self.bytes)
        )
    }

    #[must_use]
    pub fn is_image(&self) -> bool {
        self.media_type.starts_with("image/")
    }

    /// File extension for the declared media type, per [`extension_for`].
    #[must_use]
    pub fn extension(&self) -> &'static str {
        extension_for(&self.media_type)
    }
}

/// Map a declared media type to the stored file extension.
///
/// The mapping is exact: `image/png`, `image/gif`, and `image/webp` get
/// their own extensions, everything else (including `image/jpeg`) is `jpg`.
#[must_use]
pub fn extension_for(media_type: &str) -> &'static str {
    match media_type {
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "jpg",
    }
}

/// A stable reference to one stored image, as it appears in the catalog
/// document: either a storefront-relative path (`images/{id}_{index}.{ext}`)
/// or a self-contained `data:` URI for inline storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    #[must_use]
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    /// Reference for a file persisted under the images directory.
    #[must_use]
    pub fn stored(product_id: &str, index: usize, extension: &str) -> Self {
        Self(format!("images/{product_id}_{index}.{extension}"))
    }

    /// Reference that carries the image bytes themselves.
    #[must_use]
    pub fn inline(upload: &ImageUpload) -> Self {
        Self(upload.to_data_uri())
    }

    #[must_use]
    pub fn is_inline(&self) -> bool {
        self.0.starts_with("data:")
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name under the images directory, for references of the
    /// `images/...` form; `None` for inline or foreign references.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.0.strip_prefix("images/").filter(|name| !name.is_empty())
    }
}

impl std::fmt::Display for ImageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
