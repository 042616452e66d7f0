use std::fmt::Write;

use super::projector::{CityCard, ViewModel};
use super::state::Alert;

const LOADING_REFRESH_SECS: u32 = 2;

const STYLE: &str = r#"
* { box-sizing: border-box; }
body { margin: 0; font-family: sans-serif; color: #000; }
.pager { display: flex; overflow-x: auto; scroll-snap-type: x mandatory; height: 100vh; }
.card { flex: 0 0 100vw; height: 100vh; scroll-snap-align: start; display: flex; flex-direction: column;
        background-size: cover; background-position: center; }
.info { flex: 3; display: flex; flex-direction: column; justify-content: flex-end; align-items: center; margin-bottom: 50px; }
.city { font-size: 40px; font-weight: bold; }
.date { font-size: 22px; margin: 10px 0; }
.temp { font-size: 45px; margin: 10px 0; }
.minmax { font-size: 22px; font-weight: 500; margin: 10px 0; }
.forecast { flex: 2; margin: 0 15px; padding: 20px; overflow-y: auto; }
.forecast h2 { font-size: 24px; margin: 0 0 10px; }
.row { display: flex; justify-content: space-between; align-items: center; padding: 15px; margin-bottom: 15px;
       border-radius: 10px; background: #fff; box-shadow: 0 1px 4px rgba(0,0,0,.3); }
.row .day, .row .t { font-size: 18px; }
.row .day { font-weight: bold; }
.row img { width: 50px; height: 50px; }
.loading { display: flex; height: 100vh; justify-content: center; align-items: center; }
.spinner { width: 48px; height: 48px; border: 5px solid #ccc; border-top-color: #000; border-radius: 50%;
           animation: spin 1s linear infinite; }
@keyframes spin { to { transform: rotate(360deg); } }
.alert { position: fixed; top: 16px; left: 50%; transform: translateX(-50%); background: #fff; padding: 12px 20px;
         border-radius: 8px; box-shadow: 0 2px 8px rgba(0,0,0,.4); }
"#;

/// Escapes text for use in HTML content and double-quoted attributes.
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

/// Renders the whole screen: a spinner while loading, otherwise one swipeable card per city.
pub fn render_page(model: &ViewModel, alerts: &[Alert]) -> String {
    let mut html = String::from("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    if model.loading {
        let _ = writeln!(html, "<meta http-equiv=\"refresh\" content=\"{}\">", LOADING_REFRESH_SECS);
    }
    html.push_str("<title>Weather</title>\n<style>");
    html.push_str(STYLE);
    html.push_str("</style>\n</head>\n<body>\n");

    if let Some(alert) = alerts.last() {
        let _ = writeln!(
            html,
            "<div class=\"alert\" role=\"alert\"><strong>{}</strong> {}</div>",
            escape_html(&alert.title),
            escape_html(&alert.message)
        );
    }

    if model.loading {
        html.push_str("<div class=\"loading\"><div class=\"spinner\" aria-label=\"loading\"></div></div>\n");
    } else {
        html.push_str("<main class=\"pager\">\n");
        for card in &model.cards {
            render_card(&mut html, card);
        }
        html.push_str("</main>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn render_card(html: &mut String, card: &CityCard) {
    let _ = writeln!(
        html,
        "<section class=\"card\" data-city-index=\"{}\" style=\"background-color: {}; background-image: url('{}')\">",
        card.city_index,
        escape_html(&card.background.fallback_color),
        escape_html(&card.background.url)
    );
    let _ = writeln!(
        html,
        "<div class=\"info\"><div class=\"city\">{}</div><div class=\"date\">{}</div>\
         <div class=\"temp\">{}</div><div class=\"minmax\">{}</div></div>",
        escape_html(&card.title),
        escape_html(&card.date_label),
        escape_html(&card.temperature),
        escape_html(&card.min_max)
    );

    let _ = writeln!(
        html,
        "<div class=\"forecast\"><h2>{}</h2>",
        escape_html(&card.forecast_heading)
    );
    for row in &card.forecast {
        let _ = writeln!(
            html,
            "<div class=\"row\"><span class=\"day\">{}</span><span class=\"t\">{}</span>\
             <img src=\"{}\" alt=\"{}\"></div>",
            escape_html(&row.day),
            escape_html(&row.temperature),
            escape_html(&row.icon_url),
            escape_html(&row.category)
        );
    }
    html.push_str("</div>\n</section>\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::projector::{BackgroundImage, BackgroundView, ForecastRow};
    use chrono::Utc;

    fn card(title: &str) -> CityCard {
        CityCard {
            city_index: 0,
            title: title.to_string(),
            date_label: "16.10.2026".to_string(),
            category: "Rain".to_string(),
            temperature: "22 °C".to_string(),
            min_max: "Min 18 °C / Max 25 °C".to_string(),
            background: BackgroundView {
                image: BackgroundImage::Rainy,
                url: "/assets/rainy.jpg".to_string(),
                fallback_color: "#6a85b6".to_string(),
            },
            forecast_heading: "5 Günlük Hava Tahmini".to_string(),
            forecast: vec![ForecastRow {
                timestamp: 0,
                day: "Cuma".to_string(),
                temperature: "14 °C".to_string(),
                category: "Rain".to_string(),
                icon_url: "https://openweathermap.org/img/wn/10d@2x.png".to_string(),
            }],
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a<b>&\"c'"), "a&lt;b&gt;&amp;&quot;c&#39;");
        assert_eq!(escape_html("İstanbul"), "İstanbul");
    }

    #[test]
    fn test_loading_page_has_spinner_and_refresh() {
        let html = render_page(&ViewModel { loading: true, cards: Vec::new() }, &[]);
        assert!(html.contains("class=\"spinner\""));
        assert!(html.contains("http-equiv=\"refresh\""));
        assert!(!html.contains("class=\"card\""));
    }

    #[test]
    fn test_cards_render_with_background_and_rows() {
        let model = ViewModel {
            loading: false,
            cards: vec![card("Istanbul, TR")],
        };
        let html = render_page(&model, &[]);

        assert!(html.contains("Istanbul, TR"));
        assert!(html.contains("url('/assets/rainy.jpg')"));
        assert!(html.contains("5 Günlük Hava Tahmini"));
        assert!(html.contains("<span class=\"day\">Cuma</span>"));
        assert!(html.contains("10d@2x.png"));
        assert!(!html.contains("http-equiv=\"refresh\""));
        assert!(!html.contains("role=\"alert\""));
    }

    #[test]
    fn test_titles_are_escaped() {
        let model = ViewModel {
            loading: false,
            cards: vec![card("<script>x</script>, ZZ")],
        };
        let html = render_page(&model, &[]);
        assert!(html.contains("&lt;script&gt;x&lt;/script&gt;, ZZ"));
        assert!(!html.contains("<script>x"));
    }

    #[test]
    fn test_failure_shows_alert_and_no_cards() {
        let alert = Alert {
            title: "Hata".to_string(),
            message: "Veri alınırken bir sorun oluştu.".to_string(),
            raised_at: Utc::now(),
        };
        let html = render_page(&ViewModel { loading: false, cards: Vec::new() }, &[alert]);

        assert!(html.contains("role=\"alert\""));
        assert!(html.contains("Veri alınırken bir sorun oluştu."));
        assert!(!html.contains("class=\"card\""));
        assert!(!html.contains("class=\"spinner\""));
    }
}
