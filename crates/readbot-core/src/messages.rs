//! User-facing reply texts.

pub const HELP: &str = "I can keep your pages. I can also offer you one to read.

Send me a link and I will save it.
Send /random to get a random page from your list.
Send /remove <link> to delete a page you no longer need.";

pub const HELLO: &str = "Hi there!";

pub const SAVED: &str = "Saved!";
pub const ALREADY_SAVED: &str = "You already have this page in your list.";
pub const NOTHING_SAVED: &str = "You have no saved pages yet. Send me a link first.";
pub const REMOVED: &str = "Removed.";
pub const NOT_IN_LIST: &str = "That page is not in your list.";
pub const TRY_AGAIN: &str = "Something went wrong on my side. Please try again later.";

pub fn hello(saved: u64) -> String {
    match saved {
        0 => format!("{HELLO}\n\n{HELP}"),
        1 => format!("{HELLO} You have 1 saved page.\n\n{HELP}"),
        n => format!("{HELLO} You have {n} saved pages.\n\n{HELP}"),
    }
}
