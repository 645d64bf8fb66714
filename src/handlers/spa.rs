//! Serving the built UI bundle.
//!
//! Static files come from the configured dist directory. Any other non-API
//! path is answered with `index.html` so the client-side router can take
//! over. Without backend settings every page is the configuration-missing
//! notice instead.

use std::path::Path;

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use tower_http::services::{ServeDir, ServeFile};

pub const INDEX_FILE: &str = "index.html";

const CONFIG_MISSING_PAGE: &str = r#"<!doctype html>
<html lang="ar" dir="rtl">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>الإعداد غير مكتمل</title>
<style>
body{margin:0;min-height:100vh;display:grid;place-items:center;padding:24px;font-family:system-ui,sans-serif;background:#f8fafc}
.card{max-width:820px;width:100%;background:#fff;border:1px solid #e2e8f0;border-radius:18px;padding:24px}
h1{font-size:18px;color:#0f172a}
pre{direction:ltr;background:#0b1220;color:#e2e8f0;border-radius:14px;padding:16px;overflow-x:auto}
small{color:#64748b}
</style>
</head>
<body>
<div class="card">
<h1>إعداد الخادم غير مكتمل</h1>
<p>المشروع يحتاج متغيرات بيئة الاتصال بقاعدة البيانات. أضف المتغيرات ثم أعد تشغيل الخدمة.</p>
<pre>SHOWROOM_BACKEND_URL      = https://&lt;project-ref&gt;.supabase.co
SHOWROOM_BACKEND_ANON_KEY = &lt;publishable anon key&gt;</pre>
<small>ملاحظة: لا تستخدم Service Role Key هنا.</small>
</div>
</body>
</html>
"#;

/// Static files from `dist_dir`, falling back to its `index.html` with status 200.
pub fn ui_service(dist_dir: &Path) -> ServeDir<ServeFile> {
    ServeDir::new(dist_dir).fallback(ServeFile::new(dist_dir.join(INDEX_FILE)))
}

/// Page served for every UI path while the backend is not configured.
pub async fn config_missing_page() -> Response {
    (StatusCode::SERVICE_UNAVAILABLE, Html(CONFIG_MISSING_PAGE)).into_response()
}
