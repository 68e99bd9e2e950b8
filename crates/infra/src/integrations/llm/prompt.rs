//! System prompt for event extraction

use schedulr_domain::{EventType, ExtractionRequest};

/// RFC 1123 layout used for the reference date.
const REFERENCE_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S %Z";

/// Build the system prompt for one extraction request.
pub fn system_prompt(request: &ExtractionRequest) -> String {
    let event_types = EventType::ALL
        .iter()
        .map(|t| format!("\"{t}\""))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"You extract structured calendar events from user input (announcements, tickets,
advertisements and similar content) and return them as JSON.

Tasks
1. Extract event details:
- title (required)
- description: keep critical information (prices, links, host, participants, rules, format)
  without repeating other fields
- start date/time (required)
- end date/time; when missing use a known default duration for the event type, otherwise one hour
- time zone: use the zone stated in the input, or infer it from the place; start and end may
  have different zones (for example flight tickets); otherwise use the user's time zone {timezone}
- location, if provided
- eventType: one of {event_types}
- deepLink: a universal link (browser and mobile) opening the event in {calendar}

2. Resolve relative dates ("tomorrow", "next Friday") against the reference date.
Today is {today}.

3. If no event is found return an empty result array.

Input
One or more chat messages, possibly forwarded, each prefixed with its sender.

Output
A JSON object:
{{"result": [{{"title": "", "description": "", "start": {{"timestamp": "YYYY-MM-DD HH:MM:SS", "timeZone": "IANA zone"}}, "end": {{"timestamp": "YYYY-MM-DD HH:MM:SS", "timeZone": "IANA zone"}}, "location": "", "eventType": "", "deepLink": ""}}], "explanation": "brief explanation of the result"}}
Timestamps use the format YYYY-MM-DD HH:MM:SS in local time of their timeZone. Prices are numeric
or "free". Links must be valid URLs."#,
        timezone = request.timezone().name(),
        event_types = event_types,
        calendar = request.calendar.display_name(),
        today = request.reference_time.format(REFERENCE_DATE_FORMAT),
    )
}
