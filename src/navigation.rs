//! The navigation bar shown at the top of every page once logged in.
//!
//! Each party kind gets a link to its list. On small screens the same links
//! are shown in a bar fixed to the bottom of the screen.

use maud::{Markup, html};

use crate::{endpoints, party::PartyKind};

const LINK_STYLE: &str = "block py-2 px-3 text-gray-900 rounded-sm hover:bg-gray-100 \
    lg:hover:bg-transparent lg:hover:text-blue-700 lg:p-0 \
    dark:text-white lg:dark:hover:text-blue-500 dark:hover:bg-gray-700";

const CURRENT_LINK_STYLE: &str = "block py-2 px-3 text-white bg-blue-700 rounded-sm \
    lg:bg-transparent lg:text-blue-700 lg:p-0 dark:text-white lg:dark:text-blue-500";

const MOBILE_LINK_STYLE: &str = "flex w-full min-w-0 items-center justify-center rounded-lg \
    px-2.5 py-2 text-xs font-semibold text-gray-600 sm:text-sm \
    hover:bg-blue-50/70 hover:text-blue-700 dark:text-gray-300";

const MOBILE_CURRENT_LINK_STYLE: &str = "flex w-full min-w-0 items-center justify-center \
    rounded-lg bg-blue-50 px-2.5 py-2 text-xs font-semibold text-blue-700 shadow-sm \
    sm:text-sm dark:bg-blue-900/30 dark:text-blue-200";

struct Link {
    url: String,
    title: &'static str,
    is_current: bool,
}

pub struct NavBar {
    links: Vec<Link>,
}

impl NavBar {
    /// Build the navigation bar, highlighting the link for `current_kind`.
    ///
    /// Pages that do not belong to a party kind pass `None`.
    pub fn new(current_kind: Option<PartyKind>) -> NavBar {
        let mut links: Vec<Link> = PartyKind::ALL
            .iter()
            .map(|&kind| Link {
                url: kind.list_url(),
                title: kind.info().plural,
                is_current: current_kind == Some(kind),
            })
            .collect();

        links.push(Link {
            url: endpoints::LOG_OUT.to_owned(),
            title: "Log out",
            is_current: false,
        });

        NavBar { links }
    }

    pub fn into_html(self) -> Markup {
        let style = |link: &Link, current: &'static str, other: &'static str| {
            if link.is_current { current } else { other }
        };

        // Template adapted from https://flowbite.com/docs/components/navbar/#default-navbar
        html!(
            nav class="bg-white border-gray-200 dark:bg-gray-900"
            {
                div
                    class="max-w-screen-xl flex flex-wrap items-center justify-between mx-auto p-4"
                {
                    a
                        href=(endpoints::ROOT)
                        class="self-center text-2xl font-semibold whitespace-nowrap dark:text-white"
                    {
                        "Ledgerbook"
                    }

                    ul
                        class="hidden lg:flex font-medium lg:flex-row lg:space-x-8
                        rtl:space-x-reverse"
                    {
                        @for link in &self.links {
                            li {
                                a
                                    href=(link.url)
                                    class=(style(link, CURRENT_LINK_STYLE, LINK_STYLE))
                                { (link.title) }
                            }
                        }
                    }
                }
            }

            nav class="fixed inset-x-0 bottom-0 z-40 lg:hidden"
            {
                ul
                    class="mx-4 mb-4 grid grid-cols-4 gap-2 rounded-xl border border-gray-200
                    bg-white/95 px-4 py-3 shadow-lg backdrop-blur
                    dark:border-gray-700 dark:bg-gray-900/95"
                    aria-label="Primary"
                {
                    @for link in &self.links {
                        li class="min-w-0" {
                            a
                                href=(link.url)
                                class=(style(link, MOBILE_CURRENT_LINK_STYLE, MOBILE_LINK_STYLE))
                                aria-current=[link.is_current.then_some("page")]
                            {
                                span class="truncate" { (link.title) }
                            }
                        }
                    }
                }
            }
        )
    }
}
