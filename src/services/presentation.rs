use crate::models::{MAX_SCALE_FACTOR, MIN_SCALE_FACTOR, RenderedImage, ScaleFactor};
use crate::services::stage::UpscaleError;
use crate::services::upscale_service::ComparisonView;
use base64::{Engine as _, engine::general_purpose};
use image::ImageFormat;

pub const MIN_DISPLAY_WIDTH: u32 = 64;
pub const MAX_DISPLAY_WIDTH: u32 = 2048;

pub const ORIGINAL_LABEL: &str = "Original Image";
pub const UPSCALED_LABEL: &str = "Upscaled Image";

pub fn clamp_display_width(requested: Option<u32>, default: u32) -> u32 {
    requested
        .unwrap_or(default)
        .clamp(MIN_DISPLAY_WIDTH, MAX_DISPLAY_WIDTH)
}

/// Height that keeps the aspect ratio at `display_width`, rounded, never zero
pub fn display_height(width: u32, height: u32, display_width: u32) -> u32 {
    if width == 0 {
        return 1;
    }
    let scaled = (height as u64 * display_width as u64 + width as u64 / 2) / width as u64;
    u32::try_from(scaled.max(1)).unwrap_or(u32::MAX)
}

fn format_mime(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::Png => "image/png",
        ImageFormat::WebP => "image/webp",
        ImageFormat::Gif => "image/gif",
        _ => "application/octet-stream",
    }
}

fn format_name(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Jpeg => "jpeg",
        ImageFormat::Png => "png",
        ImageFormat::WebP => "webp",
        ImageFormat::Gif => "gif",
        _ => "unknown",
    }
}

/// Decodes image bytes and prepares them for display at `display_width`
pub fn render_image(
    label: &str,
    data: &[u8],
    display_width: u32,
) -> Result<RenderedImage, UpscaleError> {
    let format = image::guess_format(data)
        .map_err(|e| UpscaleError::Decode(format!("{}: {}", label, e)))?;
    let img = image::load_from_memory_with_format(data, format)
        .map_err(|e| UpscaleError::Decode(format!("{}: {}", label, e)))?;

    let (width, height) = (img.width(), img.height());

    Ok(RenderedImage {
        label: label.to_string(),
        width,
        height,
        format: format_name(format).to_string(),
        display_width,
        display_height: display_height(width, height, display_width),
        data_uri: format!(
            "data:{};base64,{}",
            format_mime(format),
            general_purpose::STANDARD.encode(data)
        ),
    })
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const STYLE: &str = r#"
    body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; margin: 0; padding: 24px; background: #f5f6fa; color: #222; }
    .container { max-width: 1200px; margin: 0 auto; background: white; border-radius: 12px; padding: 32px; box-shadow: 0 8px 24px rgba(0,0,0,0.08); }
    h1 { margin-top: 0; }
    form { display: flex; flex-direction: column; gap: 16px; max-width: 420px; }
    label { font-weight: 600; }
    button { padding: 10px 16px; border: 0; border-radius: 8px; background: #3949ab; color: white; font-size: 1em; cursor: pointer; }
    .compare { display: flex; gap: 24px; flex-wrap: wrap; align-items: flex-start; }
    .panel { flex: 1 1 0; min-width: 0; }
    .panel img { max-width: 100%; height: auto; border-radius: 8px; box-shadow: 0 4px 12px rgba(0,0,0,0.1); }
    .caption { color: #666; font-size: 0.9em; margin-top: 8px; }
    .error { background: #fdecea; color: #b71c1c; border-radius: 8px; padding: 16px; }
"#;

fn page(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{title}</title>
<style>{STYLE}</style>
</head>
<body>
<div class="container">
<h1>Image Upscaling with Cloudinary</h1>
{body}
</div>
</body>
</html>"#,
        title = escape_html(title),
    )
}

/// The upload form: file picker, scale slider, display width and submit button
pub fn render_index_page(default_display_width: u32) -> String {
    let default_scale = ScaleFactor::default();
    let body = format!(
        r#"<form action="/upscale" method="post" enctype="multipart/form-data">
  <label for="file">Upload an image</label>
  <input id="file" type="file" name="file" accept=".jpg,.jpeg,.png,image/jpeg,image/png" required>
  <label for="scale_factor">Select Upscale Factor: <output id="scale_value">{default_scale}</output></label>
  <input id="scale_factor" type="range" name="scale_factor" min="{MIN_SCALE_FACTOR}" max="{MAX_SCALE_FACTOR}" step="1" value="{default_scale}" oninput="document.getElementById('scale_value').value = this.value">
  <label for="display_width">Display width (px)</label>
  <input id="display_width" type="number" name="display_width" min="{MIN_DISPLAY_WIDTH}" max="{MAX_DISPLAY_WIDTH}" value="{default_display_width}">
  <button type="submit">Upscale Image</button>
</form>"#
    );
    page("Image Upscaling", &body)
}

fn image_panel(image: &RenderedImage) -> String {
    format!(
        r#"<div class="panel">
  <h3>{label}</h3>
  <img src="{src}" alt="{label}" width="{dw}" height="{dh}">
  <div class="caption">{w}&times;{h} {format}</div>
</div>"#,
        label = escape_html(&image.label),
        src = image.data_uri,
        dw = image.display_width,
        dh = image.display_height,
        w = image.width,
        h = image.height,
        format = escape_html(&image.format),
    )
}

fn error_panel(label: &str, error: &UpscaleError) -> String {
    format!(
        r#"<div class="panel">
  <h3>{label}</h3>
  <div class="error"><strong>{stage} failed.</strong> {message}</div>
</div>"#,
        label = escape_html(label),
        stage = escape_html(&capitalize(&error.stage().to_string())),
        message = escape_html(&error.to_string()),
    )
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Side-by-side comparison. A failed remote stage replaces only the upscaled panel.
pub fn render_comparison_page(view: &ComparisonView) -> String {
    let upscaled = match &view.upscaled {
        Ok(image) => image_panel(image),
        Err(e) => error_panel(UPSCALED_LABEL, e),
    };

    let body = format!(
        r#"<h2>Compare Images</h2>
<p class="caption">Asset <code>{id}</code>, upscale factor {scale}</p>
<div class="compare">
{original}
{upscaled}
</div>
<p><a href="/">Upscale another image</a></p>"#,
        id = escape_html(view.handle.as_str()),
        scale = view.scale_factor,
        original = image_panel(&view.original),
    );
    page("Compare Images", &body)
}

/// Shown when the flow fails before there is anything to compare
pub fn render_error_page(error: &UpscaleError) -> String {
    let body = format!(
        r#"<div class="error"><strong>{stage} failed.</strong> {message}</div>
<p><a href="/">Try again</a></p>"#,
        stage = escape_html(&capitalize(&error.stage().to_string())),
        message = escape_html(&error.to_string()),
    );
    page("Upscaling failed", &body)
}
