use super::escape;
use crate::session::SessionUser;

/// Below this viewport width the links collapse into the mobile menu.
pub const MOBILE_BREAKPOINT_PX: u32 = 768;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Mobile,
    Desktop,
}

pub fn layout_for_width(width_px: u32) -> Layout {
    if width_px < MOBILE_BREAKPOINT_PX {
        Layout::Mobile
    } else {
        Layout::Desktop
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavEvent {
    ToggleProfileMenu,
    /// A pointer press that landed outside the profile menu.
    ClickOutside,
    ToggleMobileMenu,
    SignOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavAction {
    SignOut,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NavigationView {
    user: Option<SessionUser>,
    profile_open: bool,
    mobile_open: bool,
}

impl NavigationView {
    pub fn new(user: Option<SessionUser>) -> Self {
        NavigationView {
            user,
            profile_open: false,
            mobile_open: false,
        }
    }

    pub fn user(&self) -> Option<&SessionUser> {
        self.user.as_ref()
    }

    pub fn is_profile_open(&self) -> bool {
        self.profile_open
    }

    pub fn is_mobile_open(&self) -> bool {
        self.mobile_open
    }

    pub fn handle(&mut self, event: NavEvent) -> Option<NavAction> {
        match event {
            NavEvent::ToggleProfileMenu => {
                // No menu to open without someone signed in.
                if self.user.is_some() {
                    self.profile_open = !self.profile_open;
                }
                None
            }
            NavEvent::ClickOutside => {
                self.profile_open = false;
                None
            }
            NavEvent::ToggleMobileMenu => {
                self.mobile_open = !self.mobile_open;
                None
            }
            NavEvent::SignOut => {
                self.profile_open = false;
                self.mobile_open = false;
                self.user.as_ref().map(|_| NavAction::SignOut)
            }
        }
    }

    fn avatar_html(user: &SessionUser) -> String {
        match &user.image {
            Some(image) => format!(
                r#"<img class="avatar" src="{}" alt="Profile">"#,
                escape(image)
            ),
            None => String::new(),
        }
    }

    fn sign_out_form() -> &'static str {
        r#"<form method="post" action="/signout"><button type="submit" class="link-button">Sign Out</button></form>"#
    }

    fn desktop_html(&self) -> String {
        let mut links = String::from(r#"<a href="/">Home</a>"#);
        match &self.user {
            Some(user) => {
                links.push_str(r#"<a href="/add">Add Book</a>"#);
                links.push_str(&format!(
                    r#"<div class="profile" data-menu="profile">
                <button type="button" class="profile-button" data-toggle="profile" aria-expanded="{open}">
                    <span>{name}</span>{avatar}<span class="chevron{rotated}">&#9662;</span>
                </button>
                <div class="profile-menu"{hidden}>
                    {sign_out}
                </div>
            </div>"#,
                    open = self.profile_open,
                    name = escape(user.display_name()),
                    avatar = Self::avatar_html(user),
                    rotated = if self.profile_open { " rotated" } else { "" },
                    hidden = if self.profile_open { "" } else { " hidden" },
                    sign_out = Self::sign_out_form(),
                ));
            }
            None => links.push_str(r#"<a href="/signin" class="button">Sign In</a>"#),
        }
        format!(r#"<div class="nav-desktop">{links}</div>"#)
    }

    fn mobile_html(&self) -> String {
        let mut links = String::from(r#"<a href="/">Home</a>"#);
        match &self.user {
            Some(user) => {
                links.push_str(r#"<a href="/add">Add Book</a>"#);
                links.push_str(&format!(
                    r#"<div class="mobile-user">{avatar}<span>{name}</span></div>"#,
                    avatar = Self::avatar_html(user),
                    name = escape(user.display_name()),
                ));
                links.push_str(Self::sign_out_form());
            }
            None => links.push_str(r#"<a href="/signin">Sign In</a>"#),
        }
        format!(
            r#"<button type="button" class="nav-hamburger" data-toggle="mobile" aria-label="Toggle menu" aria-expanded="{open}">&#9776;</button>
        <div class="nav-mobile" data-menu="mobile"{hidden}>{links}</div>"#,
            open = self.mobile_open,
            hidden = if self.mobile_open { "" } else { " hidden" },
        )
    }

    pub fn render_html(&self) -> String {
        format!(
            r#"<nav class="nav">
        <div class="nav-bar">
            <a href="/" class="brand">Book Catalog</a>
            {desktop}
            {mobile}
        </div>
    </nav>"#,
            desktop = self.desktop_html(),
            mobile = self.mobile_html(),
        )
    }

    /// One-line status for terminal output.
    pub fn render_text(&self) -> String {
        match &self.user {
            Some(user) => format!("Signed in as {}", user.display_name()),
            None => "Not signed in".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ada() -> SessionUser {
        SessionUser {
            id: "u1".into(),
            name: None,
            email: Some("ada@example.com".into()),
            image: Some("https://example.com/a.png".into()),
        }
    }

    #[test]
    fn breakpoint_picks_layout() {
        assert_eq!(layout_for_width(320), Layout::Mobile);
        assert_eq!(layout_for_width(767), Layout::Mobile);
        assert_eq!(layout_for_width(768), Layout::Desktop);
        assert_eq!(layout_for_width(1440), Layout::Desktop);
    }

    #[test]
    fn outside_click_closes_the_profile_menu() {
        let mut nav = NavigationView::new(Some(ada()));
        nav.handle(NavEvent::ToggleProfileMenu);
        assert!(nav.is_profile_open());
        nav.handle(NavEvent::ClickOutside);
        assert!(!nav.is_profile_open());

        nav.handle(NavEvent::ToggleProfileMenu);
        nav.handle(NavEvent::ToggleProfileMenu);
        assert!(!nav.is_profile_open());
    }

    #[test]
    fn sign_out_closes_everything() {
        let mut nav = NavigationView::new(Some(ada()));
        nav.handle(NavEvent::ToggleProfileMenu);
        nav.handle(NavEvent::ToggleMobileMenu);
        assert_eq!(nav.handle(NavEvent::SignOut), Some(NavAction::SignOut));
        assert!(!nav.is_profile_open());
        assert!(!nav.is_mobile_open());
    }

    #[test]
    fn signed_out_visitors_get_no_profile_menu() {
        let mut nav = NavigationView::new(None);
        nav.handle(NavEvent::ToggleProfileMenu);
        assert!(!nav.is_profile_open());
        assert_eq!(nav.handle(NavEvent::SignOut), None);

        let html = nav.render_html();
        assert!(html.contains(r#"href="/signin""#));
        assert!(!html.contains("Add Book"));
        assert!(!html.contains("Sign Out"));
    }

    #[test]
    fn signed_in_render_shows_identity_and_sign_out() {
        let mut nav = NavigationView::new(Some(ada()));
        let html = nav.render_html();
        assert!(html.contains("Add Book"));
        assert!(html.contains("ada@example.com"));
        assert!(html.contains(r#"src="https://example.com/a.png""#));
        assert!(html.contains(r#"<div class="profile-menu" hidden>"#));

        nav.handle(NavEvent::ToggleProfileMenu);
        assert!(nav.render_html().contains(r#"<div class="profile-menu">"#));
        assert_eq!(nav.render_text(), "Signed in as ada@example.com");
    }
}
