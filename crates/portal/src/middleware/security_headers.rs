//! Security headers middleware.
//!
//! The portal is framed by the Shopify storefront and admin, so framing is
//! restricted with `frame-ancestors` instead of `X-Frame-Options: DENY`, and
//! the cross-origin isolation headers are left off.

use axum::{
    extract::Request,
    http::{
        HeaderName, HeaderValue,
        header::{CACHE_CONTROL, CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS},
    },
    middleware::Next,
    response::Response,
};

/// CSP applied to every response.
///
/// ```text
/// default-src 'self';
/// img-src 'self' data: https://cdn.shopify.com;
/// style-src 'self';
/// script-src 'self';
/// object-src 'none';
/// base-uri 'self';
/// form-action 'self' https://*.myshopify.com;
/// frame-ancestors https://*.myshopify.com https://admin.shopify.com
/// ```
pub const CONTENT_SECURITY_POLICY_VALUE: &str = "default-src 'self'; \
     img-src 'self' data: https://cdn.shopify.com; \
     style-src 'self'; \
     script-src 'self'; \
     object-src 'none'; \
     base-uri 'self'; \
     form-action 'self' https://*.myshopify.com; \
     frame-ancestors https://*.myshopify.com https://admin.shopify.com";

/// Add security headers to all responses.
///
/// Headers applied:
/// - `Content-Security-Policy` - see [`CONTENT_SECURITY_POLICY_VALUE`]
/// - `X-Content-Type-Options: nosniff` - Prevent MIME sniffing
/// - `Referrer-Policy: strict-origin-when-cross-origin`
/// - `Cache-Control: no-store` - Dashboard pages carry customer data
/// - `Permissions-Policy` - Deny sensitive features
pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(
        CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(CONTENT_SECURITY_POLICY_VALUE),
    );

    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));

    headers.insert(
        REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    // Static assets set their own caching
    if !headers.contains_key(CACHE_CONTROL) {
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    }

    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static(
            "camera=(), \
             geolocation=(), \
             microphone=(), \
             payment=(), \
             usb=()",
        ),
    );

    response
}
