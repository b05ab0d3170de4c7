use blogkit_docs::html::escape;

/// Wrap a rendered post body in the site page.
pub fn post_page(site_title: &str, title: &str, when_published: Option<&str>, body: &str) -> String {
    let published = match when_published {
        Some(when) => format!("<p class=\"published\">Published {}</p>\n", escape(when)),
        None => "<p class=\"published draft\">Draft</p>\n".to_string(),
    };
    format!(
        "<!DOCTYPE html>
<html lang=\"en\">
<head>
<meta charset=\"utf-8\">
<title>{title} | {site}</title>
<link rel=\"stylesheet\" href=\"/assets/blog.css\">
</head>
<body>
<article class=\"post\">
<h1 class=\"post-title\">{title}</h1>
{published}{body}</article>
</body>
</html>
",
        title = escape(title),
        site = escape(site_title),
    )
}
