//! What the assistant says.

pub const GREETING: &str = "Hello! I'm your smart shopping assistant. \
I'll help you find the best deals and prices from various online stores. \
How can I assist you today?";

pub const ASK_PRODUCT: &str = "What product are you looking for?";

pub const ASK_COUNTRY: &str = "In which country would you like to search for the product?";

pub const ASK_COUNT: &str = "How many results would you like in the final report?";

pub const REPORT_READY: &str =
    "The report has been successfully generated! You can download the results now.";

pub const SEARCH_FAILED: &str = "An error occurred during the search. Please try again later.";

/// Default narration shown while a search runs, paired with offsets in
/// milliseconds from the start of the search.
pub const NARRATION: [(u64, &str); 4] = [
    (0, "Starting the search for you..."),
    (1_000, "Searching in online stores..."),
    (3_000, "Multiple products found, comparing prices..."),
    (5_000, "Analyzing the best deals and preparing the final report..."),
];

pub fn summary(product_name: &str, country: &str, result_count: u32) -> String {
    format!(
        "I will search for \"{}\" in {}, and I will provide you with a report featuring \
         the best {} results. Would you like me to start the search?",
        product_name, country, result_count
    )
}

pub fn service_error(message: &str) -> String {
    format!("An error occurred: {}", message)
}
