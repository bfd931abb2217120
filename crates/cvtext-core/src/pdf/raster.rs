//! Fallback rasterization of a single page.
//!
//! There is no general content-stream renderer here. Scanned documents
//! carry the page scan as an image XObject, so rasterizing a page means
//! decoding its dominant image and scaling it to the page's intrinsic
//! dimensions times the requested factor. A page whose appearance is built
//! purely from vector or text operators cannot be rendered and reports
//! `RenderFailed`.

use image::{DynamicImage, ImageBuffer, Rgba, imageops::FilterType};
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, trace};

use super::DocumentHandle;
use crate::error::{ExtractError, Result};

/// Page size assumed when no MediaBox is present (US Letter, in points).
const DEFAULT_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

/// Upper bound on either output dimension. A document declaring an absurd
/// MediaBox still renders, scaled down to fit this limit.
const MAX_RENDER_DIM: u32 = 4096;

/// A page rendered to pixels at a fixed scale.
#[derive(Debug)]
pub struct PageRaster {
    /// Page number (1-indexed).
    pub number: u32,
    /// Pixel buffer sized to the page dimensions times the scale factor.
    pub image: DynamicImage,
}

/// Render page `number` to a pixel buffer at `scale` times its intrinsic
/// dimensions.
///
/// Fails with `RenderFailed` when the page does not exist (zero-page
/// documents fall out here) or carries no decodable raster content.
pub fn rasterize_page(doc: &DocumentHandle, number: u32, scale: f32) -> Result<PageRaster> {
    let page_id = doc
        .page_id(number)
        .ok_or_else(|| ExtractError::RenderFailed {
            page: number,
            reason: "page does not exist".to_string(),
        })?;

    let (page_width, page_height) = page_dimensions(doc.inner(), page_id);
    let (target_width, target_height) = target_dimensions(page_width, page_height, scale);

    let source =
        dominant_page_image(doc.inner(), page_id).ok_or_else(|| ExtractError::RenderFailed {
            page: number,
            reason: "page has no decodable raster content".to_string(),
        })?;

    debug!(
        "rasterizing page {}: {}x{} scan scaled to {}x{}",
        number,
        source.width(),
        source.height(),
        target_width,
        target_height
    );
    let image = source.resize_exact(target_width, target_height, FilterType::Lanczos3);
    Ok(PageRaster { number, image })
}

/// Intrinsic page size in points, from the (possibly inherited) MediaBox.
fn page_dimensions(doc: &Document, page_id: ObjectId) -> (f32, f32) {
    let media_box = resolve_inherited(doc, page_id, b"MediaBox")
        .and_then(|obj| rect_values(doc, &obj))
        .unwrap_or(DEFAULT_MEDIA_BOX);
    let width = (media_box[2] - media_box[0]).abs();
    let height = (media_box[3] - media_box[1]).abs();
    (width, height)
}

fn target_dimensions(width: f32, height: f32, scale: f32) -> (u32, u32) {
    let w = (width * scale).round().max(1.0);
    let h = (height * scale).round().max(1.0);

    let max_dim = w.max(h);
    if max_dim <= MAX_RENDER_DIM as f32 {
        return (w as u32, h as u32);
    }

    // Shrink to fit within the limit while keeping the aspect ratio.
    let shrink = MAX_RENDER_DIM as f32 / max_dim;
    (((w * shrink) as u32).max(1), ((h * shrink) as u32).max(1))
}

/// Look up `key` on a page-tree node, walking `/Parent` links for
/// inheritable attributes (Resources, MediaBox).
fn resolve_inherited(doc: &Document, node_id: ObjectId, key: &[u8]) -> Option<Object> {
    let node = doc.get_object(node_id).ok()?.as_dict().ok()?;
    if let Ok(value) = node.get(key) {
        if let Ok((_, value)) = doc.dereference(value) {
            return Some(value.clone());
        }
    }
    match node.get(b"Parent") {
        Ok(Object::Reference(parent_id)) => resolve_inherited(doc, *parent_id, key),
        _ => None,
    }
}

fn rect_values(doc: &Document, obj: &Object) -> Option<[f32; 4]> {
    let array = obj.as_array().ok()?;
    if array.len() != 4 {
        return None;
    }
    let mut rect = [0.0f32; 4];
    for (slot, value) in rect.iter_mut().zip(array) {
        let (_, value) = doc.dereference(value).ok()?;
        *slot = number_value(value)?;
    }
    Some(rect)
}

fn number_value(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

/// The largest decodable image reachable from the page's XObject resources.
/// For a scanned page that is the full-page scan; decorative assets lose on
/// pixel area. Only this page's resources are considered, so the result is
/// always attributable to the requested page.
fn dominant_page_image(doc: &Document, page_id: ObjectId) -> Option<DynamicImage> {
    let resources = resolve_inherited(doc, page_id, b"Resources")?;
    let xobjects = resources.as_dict().ok()?.get(b"XObject").ok()?;
    let (_, xobjects) = doc.dereference(xobjects).ok()?;
    let xobjects = xobjects.as_dict().ok()?;

    let mut best: Option<DynamicImage> = None;
    for (name, entry) in xobjects.iter() {
        let Ok((_, object)) = doc.dereference(entry) else {
            continue;
        };
        if let Some(image) = decode_image_object(doc, object) {
            trace!(
                "page image candidate {}: {}x{}",
                String::from_utf8_lossy(name),
                image.width(),
                image.height()
            );
            if best
                .as_ref()
                .is_none_or(|current| pixel_area(&image) > pixel_area(current))
            {
                best = Some(image);
            }
        }
    }
    best
}

fn pixel_area(image: &DynamicImage) -> u64 {
    u64::from(image.width()) * u64::from(image.height())
}

/// Decode an image XObject stream into pixels. JPEG payloads decode from
/// the compressed stream; raw buffers go through `image_from_raw`. JPEG2000
/// and fax/JBIG2 payloads have no decoder here.
fn decode_image_object(doc: &Document, object: &Object) -> Option<DynamicImage> {
    let Object::Stream(stream) = object else {
        return None;
    };
    let dict = &stream.dict;

    let subtype = dict.get(b"Subtype").ok()?;
    if subtype.as_name().ok()? != b"Image" {
        return None;
    }

    let width = u32::try_from(dict.get(b"Width").ok()?.as_i64().ok()?).ok()?;
    let height = u32::try_from(dict.get(b"Height").ok()?.as_i64().ok()?).ok()?;

    if let Some(filter) = image_filter(dict) {
        match filter.as_slice() {
            b"DCTDecode" => {
                trace!("decoding JPEG page image");
                return image::load_from_memory_with_format(
                    &stream.content,
                    image::ImageFormat::Jpeg,
                )
                .ok();
            }
            b"JPXDecode" | b"CCITTFaxDecode" | b"JBIG2Decode" => {
                trace!("unsupported image filter {:?}", String::from_utf8_lossy(&filter));
                return None;
            }
            _ => {}
        }
    }

    let data = match stream.decompressed_content() {
        Ok(data) => data,
        Err(_) => stream.content.clone(),
    };

    let color_space = dict
        .get(b"ColorSpace")
        .ok()
        .and_then(|obj| match obj {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(array) => array.first().and_then(|o| o.as_name().ok()),
            Object::Reference(r) => doc.get_object(*r).ok().and_then(|o| o.as_name().ok()),
            _ => None,
        })
        .unwrap_or(b"DeviceRGB");

    let bits = dict
        .get(b"BitsPerComponent")
        .ok()
        .and_then(|obj| obj.as_i64().ok())
        .unwrap_or(8) as u8;

    image_from_raw(&data, width, height, color_space, bits)
}

/// First (or only) name in the stream's Filter entry.
fn image_filter(dict: &Dictionary) -> Option<Vec<u8>> {
    match dict.get(b"Filter").ok()? {
        Object::Name(name) => Some(name.clone()),
        Object::Array(array) => array
            .first()
            .and_then(|o| o.as_name().ok())
            .map(|name| name.to_vec()),
        _ => None,
    }
}

/// Wrap a raw 8-bit RGB or grayscale buffer into an RGBA image.
///
/// `width` and `height` are declarations read from the document; they are
/// checked against `data.len()` before any buffer is sized from them.
fn image_from_raw(
    data: &[u8],
    width: u32,
    height: u32,
    color_space: &[u8],
    bits_per_component: u8,
) -> Option<DynamicImage> {
    if bits_per_component != 8 {
        trace!("unsupported bits per component: {}", bits_per_component);
        return None;
    }
    if width == 0 || height == 0 {
        return None;
    }

    let channels: usize = if color_space == b"DeviceRGB" || color_space == b"RGB" {
        3
    } else if color_space == b"DeviceGray" || color_space == b"G" {
        1
    } else {
        trace!(
            "unsupported color space: {:?}",
            String::from_utf8_lossy(color_space)
        );
        return None;
    };

    let pixels = (width as usize).checked_mul(height as usize)?;
    let samples = pixels.checked_mul(channels)?;
    if data.len() < samples {
        return None;
    }

    let mut rgba = Vec::with_capacity(pixels.checked_mul(4)?);
    if channels == 3 {
        for chunk in data[..samples].chunks_exact(3) {
            rgba.extend_from_slice(chunk);
            rgba.push(255);
        }
    } else {
        for &gray in &data[..samples] {
            rgba.extend_from_slice(&[gray, gray, gray, 255]);
        }
    }

    ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, rgba).map(DynamicImage::ImageRgba8)
}
