//! Prompt generation for trained studios.
//!
//! Each background theme owns a pool of scenes. Prompts are drawn
//! round-robin across the studio's themes so a small plan still gets
//! variety; once every scene has been used the sequence starts over.

use crate::models::{BackgroundTheme, StudioAttributes};

/// Solid backdrop colour with matching outfits.
struct SolidColour {
    colour: &'static str,
    woman: &'static str,
    man: &'static str,
}

const SOLID_COLOURS: [SolidColour; 10] = [
    SolidColour {
        colour: "navy blue",
        woman: "white button-up blouse with a structured collar",
        man: "a white button-up shirt",
    },
    SolidColour {
        colour: "gray",
        woman: "black ribbed turtleneck with structured shoulders",
        man: "a black long-sleeve button-up shirt",
    },
    SolidColour {
        colour: "arctic white",
        woman: "deep charcoal blazer over a pastel blouse",
        man: "a charcoal ribbed turtleneck sweater",
    },
    SolidColour {
        colour: "white",
        woman: "soft blush pink knit sweater",
        man: "a midnight blue blazer over a black crew-neck sweater",
    },
    SolidColour {
        colour: "steel blue",
        woman: "high-neck blouse with subtle texture in soft lavender",
        man: "a light blue button-up shirt",
    },
    SolidColour {
        colour: "charcoal",
        woman: "olive green knit turtleneck",
        man: "a deep olive green blazer over a light gray shirt",
    },
    SolidColour {
        colour: "pewter gray",
        woman: "caramel ribbed knit turtleneck",
        man: "a heather gray knit sweater",
    },
    SolidColour {
        colour: "midnight blue",
        woman: "one-button linen blazer with a beige blouse",
        man: "a dark gray blazer with a white shirt",
    },
    SolidColour {
        colour: "gunmetal gray",
        woman: "collarless blazer in a neutral color",
        man: "a textured charcoal gray crew-neck sweater",
    },
    SolidColour {
        colour: "graphite gray",
        woman: "muted satin blouse in soft taupe",
        man: "a deep burgundy knit sweater",
    },
];

/// A non-studio scene: where the subject is and what they wear.
struct Scene {
    opening: &'static str,
    setting: &'static str,
    woman: &'static str,
    man: &'static str,
    finish: &'static str,
}

const OFFICE_SCENES: [Scene; 3] = [
    Scene {
        opening: "a sleek professional portrait",
        setting: "standing in a modern high-rise office with a blurred city skyline behind",
        woman: "steel blue blazer over a crisp white shirt",
        man: "a navy blue blazer over a light gray shirt",
        finish: "bright natural lighting with balanced shadows, composed expression",
    },
    Scene {
        opening: "a corporate portrait",
        setting: "in an office with cabinets and large windows in the background",
        woman: "ivory blazer over a taupe blouse",
        man: "a soft taupe blazer over a white shirt",
        finish: "natural light, front view centered composition, confident pose",
    },
    Scene {
        opening: "an executive portrait",
        setting: "in a luxurious corner office with rich wood textures",
        woman: "navy blue blazer over a white blouse",
        man: "a dark blue tailored suit jacket over a white shirt",
        finish: "strong directional lighting, authoritative yet approachable",
    },
];

const CITY_SCENES: [Scene; 2] = [
    Scene {
        opening: "a confident urban headshot",
        setting: "on a rooftop terrace with a softly blurred city skyline",
        woman: "textured double-breasted jacket over a round-neck t-shirt",
        man: "a soft camel crew-neck sweater",
        finish: "cinematic golden-hour lighting",
    },
    Scene {
        opening: "a modern street portrait",
        setting: "on a quiet city street with blurred storefronts",
        woman: "black ribbed crew-neck sweater",
        man: "a navy blue suit jacket with a pale cream shirt",
        finish: "overcast soft light, relaxed confident expression",
    },
];

const NATURE_SCENES: [Scene; 2] = [
    Scene {
        opening: "a natural professional portrait",
        setting: "in a sunlit park with blurred greenery in the background",
        woman: "beige blazer over a crisp white blouse",
        man: "a navy blazer over a crisp white shirt",
        finish: "natural sunlight with soft fill, warm and approachable",
    },
    Scene {
        opening: "an outdoor portrait",
        setting: "in a serene garden with soft bokeh foliage",
        woman: "wrap blouse in a neutral beige",
        man: "a light beige blazer with a white shirt",
        finish: "diffused daylight, relaxed pose",
    },
];

const BOOKSHELF_SCENES: [Scene; 2] = [
    Scene {
        opening: "a thoughtful professional portrait",
        setting: "in front of a well-stocked wooden bookshelf",
        woman: "light beige knit top with a structured collar",
        man: "a dark burgundy blazer over a white shirt",
        finish: "warm indoor lighting, intellectual atmosphere",
    },
    Scene {
        opening: "a home office portrait",
        setting: "in a study with bookshelves and a desk lamp softly blurred",
        woman: "cream cardigan over a silk camisole",
        man: "a charcoal quarter-zip over a collared shirt",
        finish: "soft window light, calm expression",
    },
];

const GRADIENT_SCENES: [Scene; 2] = [
    Scene {
        opening: "a modern tech headshot",
        setting: "against an abstract gradient backdrop with blue and teal hues",
        woman: "black midi fitted dress",
        man: "a classic black turtleneck sweater",
        finish: "clean minimalist aesthetic, even studio lighting",
    },
    Scene {
        opening: "a contemporary profile portrait",
        setting: "against a smooth warm gradient from peach to soft coral",
        woman: "tailored white blazer over a black top",
        man: "a slate gray blazer over a white t-shirt",
        finish: "crisp key light, friendly expression",
    },
];

fn subject(attrs: &StudioAttributes) -> String {
    let mut subject = format!(
        "{} {} {} in {} {}",
        attrs.ethnicity,
        attrs.trigger_word,
        attrs.gender,
        attrs.pronoun(),
        attrs.age
    );
    if !attrs.eye_color.trim().is_empty() {
        subject.push_str(&format!(", with {} eyes", attrs.eye_color));
    }
    if !attrs.hair_style.trim().is_empty() {
        subject.push_str(&format!(", {}", attrs.hair_style));
    }
    subject.push_str(attrs.glasses_text());
    subject
}

fn outfit<'a>(attrs: &StudioAttributes, woman: &'a str, man: &'a str) -> &'a str {
    if attrs.is_woman() { woman } else { man }
}

fn solid_prompt(attrs: &StudioAttributes, solid: &SolidColour) -> String {
    format!(
        "a photorealistic studio portrait of a professional {}, half body portrait, \
         on a plain solid {} background, wearing {}, realistic skin texture with minimal makeup, \
         soft lighting with gentle shadows, centered composition, captured on a 50mm lens, RAW format",
        subject(attrs),
        solid.colour,
        outfit(attrs, solid.woman, solid.man)
    )
}

fn scene_prompt(attrs: &StudioAttributes, scene: &Scene) -> String {
    format!(
        "{} of {}, {}, wearing {}, {}, photorealistic, realistic skin texture, high resolution, sharp focus",
        scene.opening,
        subject(attrs),
        scene.setting,
        outfit(attrs, scene.woman, scene.man),
        scene.finish
    )
}

/// Every distinct prompt available for one theme.
pub fn theme_pool(attrs: &StudioAttributes, theme: BackgroundTheme) -> Vec<String> {
    let scenes: &[Scene] = match theme {
        BackgroundTheme::Studio => {
            return SOLID_COLOURS.iter().map(|s| solid_prompt(attrs, s)).collect();
        }
        BackgroundTheme::Office => &OFFICE_SCENES,
        BackgroundTheme::City => &CITY_SCENES,
        BackgroundTheme::Nature => &NATURE_SCENES,
        BackgroundTheme::Bookshelf => &BOOKSHELF_SCENES,
        BackgroundTheme::Gradient => &GRADIENT_SCENES,
    };
    scenes.iter().map(|s| scene_prompt(attrs, s)).collect()
}

/// Generate `count` prompts for a studio.
///
/// Themes are taken from the attributes (all themes when none are
/// selected). Prompts are distinct until the combined pool runs out.
pub fn generate_prompts(attrs: &StudioAttributes, count: usize) -> Vec<String> {
    let themes: Vec<BackgroundTheme> = if attrs.backgrounds.is_empty() {
        BackgroundTheme::ALL.to_vec()
    } else {
        let mut unique = Vec::new();
        for theme in &attrs.backgrounds {
            if !unique.contains(theme) {
                unique.push(*theme);
            }
        }
        unique
    };

    let pools: Vec<Vec<String>> = themes.iter().map(|t| theme_pool(attrs, *t)).collect();

    // Interleave the pools: first scene of each theme, then the second, ...
    let depth = pools.iter().map(Vec::len).max().unwrap_or(0);
    let mut ordered = Vec::new();
    for i in 0..depth {
        for pool in &pools {
            if let Some(prompt) = pool.get(i) {
                ordered.push(prompt.clone());
            }
        }
    }

    if ordered.is_empty() {
        return Vec::new();
    }

    ordered.iter().cycle().take(count).cloned().collect()
}
