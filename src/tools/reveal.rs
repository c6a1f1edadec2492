use crate::scraping::dom::{closest, inner_text, parse_selector};
use crate::scraping::driver::{ElementTarget, PageDriver};
use crate::scraping::listing::has_phone;
use regex::Regex;
use scraper::{ElementRef, Html};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Interactive elements that may hide a phone number.
pub const REVEAL_CONTROL_SELECTOR: &str = r#"button, a, [class*="phone"], [class*="tel"]"#;

fn reveal_label() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)afficher.*n°|afficher.*num[ée]ro|voir.*num[ée]ro|afficher.*t[ée]l|show.*(?:phone|number)",
        )
        .expect("valid reveal label regex")
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealTiming {
    /// Pause between scrolling a control into view and clicking it.
    pub before_click: Duration,
    /// Pause for the DOM to show the number after a click.
    pub after_click: Duration,
}

impl Default for RevealTiming {
    fn default() -> Self {
        Self {
            before_click: Duration::from_millis(150),
            after_click: Duration::from_millis(400),
        }
    }
}

impl RevealTiming {
    pub fn immediate() -> Self {
        Self {
            before_click: Duration::ZERO,
            after_click: Duration::ZERO,
        }
    }
}

/// Controls to activate on one snapshot, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevealPlan {
    pub targets: Vec<ElementTarget>,
    /// Qualifying controls whose card already shows a number.
    pub already_visible: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RevealOutcome {
    pub clicked: usize,
    pub already_visible: usize,
    pub failed: usize,
}

/// Visible label, else the accessible one.
fn control_label(control: ElementRef<'_>) -> String {
    let text = inner_text(control);
    if !text.is_empty() {
        return text;
    }
    control
        .value()
        .attr("aria-label")
        .unwrap_or_default()
        .trim()
        .to_string()
}

fn is_reveal_control(control: ElementRef<'_>) -> bool {
    reveal_label().is_match(&control_label(control))
}

/// Find the reveal controls on a page snapshot.
///
/// A wrapper matching the control selector (e.g. `div.phone`) is ignored
/// when a nested control qualifies too, so each reveal is clicked once.
pub fn plan_reveals(html: &str) -> RevealPlan {
    let document = Html::parse_document(html);
    let Some(selector) = parse_selector(REVEAL_CONTROL_SELECTOR) else {
        return RevealPlan::default();
    };

    let mut plan = RevealPlan::default();
    for (index, control) in document.select(&selector).enumerate() {
        if !is_reveal_control(control) {
            continue;
        }
        if control.select(&selector).any(is_reveal_control) {
            continue;
        }

        let card = closest(control, &["li", "article"])
            .or_else(|| control.parent().and_then(ElementRef::wrap));
        if card.is_some_and(|card| has_phone(&inner_text(card))) {
            plan.already_visible += 1;
            continue;
        }

        plan.targets.push(ElementTarget::new(REVEAL_CONTROL_SELECTOR, index));
    }
    plan
}

async fn activate(
    driver: &dyn PageDriver,
    target: &ElementTarget,
    timing: &RevealTiming,
) -> crate::core::Result<()> {
    driver.scroll_into_view(target).await?;
    tokio::time::sleep(timing.before_click).await;
    driver.click(target).await?;
    tokio::time::sleep(timing.after_click).await;
    Ok(())
}

/// Click every reveal control on the current page.
///
/// Controls are activated from the last to the first: a revealed number may
/// insert new links, which only shifts the ordinals of later controls.
/// Individual failures are logged and the sequence goes on.
pub async fn reveal_phones(driver: &dyn PageDriver, timing: &RevealTiming) -> RevealOutcome {
    let html = match driver.html().await {
        Ok(html) => html,
        Err(e) => {
            warn!("phone reveal: cannot read page: {}", e);
            return RevealOutcome::default();
        }
    };

    let plan = plan_reveals(&html);
    let mut outcome = RevealOutcome {
        already_visible: plan.already_visible,
        ..Default::default()
    };

    for target in plan.targets.iter().rev() {
        match activate(driver, target, timing).await {
            Ok(()) => outcome.clicked += 1,
            Err(e) => {
                debug!("phone reveal failed on {}: {}", target, e);
                outcome.failed += 1;
            }
        }
    }

    info!(
        "phone reveal: {} clicked, {} already visible, {} failed",
        outcome.clicked, outcome.already_visible, outcome.failed
    );
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reveal_label_variants() {
        for label in [
            "Afficher le N°",
            "Afficher le numéro",
            "Voir le numero",
            "Afficher tél",
            "Show phone number",
        ] {
            assert!(reveal_label().is_match(label), "{label}");
        }
        assert!(!reveal_label().is_match("Afficher la carte"));
        assert!(!reveal_label().is_match("Voir le plan"));
    }

    #[test]
    fn test_plan_skips_cards_with_visible_numbers() {
        let plan = plan_reveals(
            r#"<ul>
              <li><a href="/pros/1">A</a><button>Afficher le N°</button></li>
              <li><a href="/pros/2">B</a><span>01 23 45 67 89</span><button>Afficher le N°</button></li>
              <li><a href="/pros/3">C</a><div class="phone-box"><button aria-label="Afficher le numéro"></button></div></li>
              <li><a href="/pros/4">D</a><button>Itinéraire</button></li>
            </ul>"#,
        );
        assert_eq!(plan.already_visible, 1);
        let indices: Vec<usize> = plan.targets.iter().map(|t| t.index).collect();
        // a(0) button(1) | a(2) button(3) | a(4) div(5) button(6) | a(7) button(8)
        assert_eq!(indices, vec![1, 6]);
    }

    #[test]
    fn test_plan_targets_card_showing_only_a_registration_number() {
        let plan = plan_reveals(
            r#"<ul>
              <li><a href="/pros/1">A</a><p>SIRET 80312345678900</p><button>Afficher le N°</button></li>
            </ul>"#,
        );
        assert_eq!(plan.already_visible, 0);
        assert_eq!(plan.targets, vec![ElementTarget::new(REVEAL_CONTROL_SELECTOR, 1)]);
    }
}
