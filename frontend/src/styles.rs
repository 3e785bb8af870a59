//! Stylesheets injected at mount time.

use crate::dom::{build, PresentationTree};

pub const NOTIFICATION_CSS: &str = r#"
    @keyframes slideInRight {
        from { transform: translateX(400px); opacity: 0; }
        to { transform: translateX(0); opacity: 1; }
    }
    @keyframes slideOutRight {
        from { transform: translateX(0); opacity: 1; }
        to { transform: translateX(400px); opacity: 0; }
    }
    .notification-close:hover {
        background: rgba(255,255,255,0.2);
    }
"#;

pub const MOBILE_MENU_CSS: &str = r#"
    @media (max-width: 968px) {
        .nav-links {
            position: fixed;
            top: 70px;
            left: -100%;
            width: 100%;
            height: calc(100vh - 70px);
            background: linear-gradient(135deg, var(--primary-green), var(--dark-green));
            flex-direction: column;
            padding: 2rem;
            transition: left 0.3s ease;
            overflow-y: auto;
        }
        .nav-links.active { left: 0; }
        .nav-links li { width: 100%; margin-bottom: 0.5rem; }
        .nav-links a {
            display: block;
            width: 100%;
            padding: 1rem;
            text-align: center;
            font-size: 1.1rem;
        }
    }
"#;

pub const ACTIVE_LINK_CSS: &str = r#"
    .nav-links a.active { background: rgba(255,255,255,0.2); }
    .nav-links a.active::before { width: 80%; }
"#;

pub const PRINT_CSS: &str = r#"
    @media print {
        nav, .hero, .contact-form, footer, .scroll-top-btn { display: none !important; }
        section { page-break-inside: avoid; }
        body { font-size: 12pt; line-height: 1.5; color: black; }
        h1, h2, h3 { page-break-after: avoid; }
        .feature-card, .team-card, .benefit-card { box-shadow: none; border: 1px solid #ddd; }
    }
"#;

/// Appends the screen and print stylesheets to the document head.
pub fn install(tree: &dyn PresentationTree) {
    let head = tree.head();
    let screen = [NOTIFICATION_CSS, MOBILE_MENU_CSS, ACTIVE_LINK_CSS].concat();
    tree.append_child(head, build(tree, "style", "", Some(&screen)));

    let print = build(tree, "style", "", Some(PRINT_CSS));
    tree.set_attribute(print, "media", "print");
    tree.append_child(head, print);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryTree;

    #[test]
    fn installs_screen_and_print_sheets() {
        let tree = MemoryTree::new();
        install(&tree);
        let sheets = tree.query_in(tree.head(), "style");
        assert_eq!(sheets.len(), 2);
        assert!(tree.text(sheets[0]).contains("slideOutRight"));
        assert_eq!(tree.attribute(sheets[1], "media").as_deref(), Some("print"));
    }
}
