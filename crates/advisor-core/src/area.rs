//! Face-area recommendations: a fixed product list and a canned care routine per area.

use crate::prompt::BRAND;

/// Areas with a curated product list and routine.
pub const FACE_AREAS: [&str; 6] = ["forehead", "eyes", "nose", "cheeks", "lips", "chin"];

const MICELLAR: &str = "SkinActive Micellar Cleansing Water";
const HA_SERUM: &str = "Revitalift 1.5% Hyaluronic Acid Serum";
const SA_CLEANSER: &str = "Renewing SA Cleanser";
const SPF30: &str = "RevitaLift Triple Power Broad Spectrum SPF 30 Sunscreen";
const HYDRATING_CLEANSER: &str = "Hydrating Facial Cleanser";
const FOAMING_CLEANSER: &str = "Foaming Facial Cleanser";
const EFFACLAR: &str = "Effaclar Duo Dual Acne Treatment";

fn key(area: &str) -> String {
    area.trim().to_ascii_lowercase()
}

/// Catalog product names recommended for `area`, in display order. Unknown areas get none.
pub fn recommended_names(area: &str) -> &'static [&'static str] {
    match key(area).as_str() {
        "forehead" => &[HA_SERUM, MICELLAR, SA_CLEANSER, SPF30],
        "eyes" => &[
            MICELLAR,
            "Eye Repair Cream",
            "Minéral 89 Hyaluronic Acid Booster",
            HYDRATING_CLEANSER,
        ],
        "nose" => &[SA_CLEANSER, MICELLAR, FOAMING_CLEANSER, EFFACLAR],
        "cheeks" => &[
            HA_SERUM,
            SPF30,
            "Moisturizing Cream",
            MICELLAR,
            "Aqualia Thermal Rich Cream",
        ],
        "lips" => &[
            MICELLAR,
            HYDRATING_CLEANSER,
            "Toleriane Hydrating Gentle Cleanser",
        ],
        "chin" => &[EFFACLAR, SA_CLEANSER, MICELLAR, FOAMING_CLEANSER],
        _ => &[],
    }
}

/// The user-side line shown when an area is picked.
pub fn area_request(area: &str) -> String {
    format!(
        "I want to focus on my {} area and get product recommendations.",
        area.trim()
    )
}

/// Canned routine for `area`, mentioning how many products were found for it.
pub fn area_routine(area: &str, product_count: usize) -> String {
    let n = product_count;
    match key(area).as_str() {
        "forehead" => format!(
            "Here's your personalized FOREHEAD care routine using {n} recommended {BRAND} products:

**MORNING ROUTINE:**
1. **Cleanse** - Use Micellar Cleansing Water on a cotton pad to gently remove impurities
2. **Hydrate** - Apply Revitalift Hyaluronic Acid Serum to forehead area, focusing on fine lines
3. **Protect** - Don't forget sunscreen!

**EVENING ROUTINE:**
1. **Deep Cleanse** - Remove makeup and dirt with Micellar Cleansing Water
2. **Weekly Treatment** - Use Renewing SA Cleanser 2-3 times per week on forehead to prevent breakouts
3. **Night Care** - Apply serum before bed

**FOREHEAD-SPECIFIC TIPS:**
- Pat products gently, don't rub
- Focus on horizontal lines when applying anti-aging serum
- SA cleanser helps prevent forehead acne"
        ),
        "eyes" => format!(
            "Here's your personalized EYE AREA care routine using {n} recommended products:

**MORNING ROUTINE:**
1. **Gentle Cleanse** - Use Micellar Cleansing Water on cotton pad, no rubbing
2. **Hydrate** - Gently pat Eye Repair Cream around eye area
3. **Boost** - Apply Minéral 89 for extra hydration

**EVENING ROUTINE:**
1. **Makeup Removal** - Micellar Water removes eye makeup without tugging
2. **Night Care** - Light layer of Eye Repair Cream around eyes

**EYE AREA-SPECIFIC TIPS:**
- Never rub or pull the delicate eye skin
- Use ring finger for gentlest application
- Apply products from inner to outer corner
- Keep products at least 1/4 inch from lash line"
        ),
        "nose" => format!(
            "Here's your personalized NOSE care routine using {n} recommended products:

**MORNING ROUTINE:**
1. **Daily Cleanse** - Use Foaming Facial Cleanser on nose area to remove oil buildup
2. **Oil Control** - Let skin air dry completely

**EVENING ROUTINE:**
1. **Deep Cleanse** - Thorough cleansing with Micellar Water
2. **Weekly Treatment** - Use Renewing SA Cleanser on nose 2-3 times per week

**NOSE-SPECIFIC TIPS:**
- Pay extra attention to sides of nose where oil accumulates
- SA cleanser helps with blackheads and enlarged pores
- Don't over-cleanse as it can increase oil production"
        ),
        "cheeks" => format!(
            "Here's your personalized CHEEK care routine using {n} recommended products:

**MORNING ROUTINE:**
1. **Gentle Cleanse** - Use Micellar Water all over cheek area
2. **Hydrate** - Apply Revitalift Hyaluronic Acid Serum in upward motions
3. **Moisturize** - Follow with Moisturizing Cream for extra hydration
4. **Protect** - RevitaLift SPF 30 Sunscreen for UV protection

**EVENING ROUTINE:**
1. **Remove Impurities** - Thorough cleansing with Micellar Water
2. **Night Repair** - Apply serum for overnight renewal

**CHEEK-SPECIFIC TIPS:**
- Always apply products in upward, outward motions
- Cheeks need extra hydration and sun protection
- Layer products from thinnest to thickest consistency"
        ),
        "lips" => format!(
            "Here's your personalized LIP care routine using {n} recommended products:

**MORNING & EVENING:**
1. **Gentle Cleanse** - Use Micellar Water to remove lip products
2. **Hydrate** - Follow with Hydrating Facial Cleanser for gentle care
3. **Prep for Products** - Clean lips absorb treatments better

**LIP-SPECIFIC TIPS:**
- Use gentle circular motions when cleansing
- Never pull or tug on lip skin
- Follow with a good lip balm after cleansing
- Micellar water removes even waterproof lip products"
        ),
        "chin" => format!(
            "Here's your personalized CHIN care routine using {n} recommended products:

**MORNING ROUTINE:**
1. **Daily Cleanse** - Focus on chin area with Micellar Water
2. **Treatment** - Apply Effaclar Duo for acne prevention

**EVENING ROUTINE:**
1. **Deep Cleanse** - Remove buildup with Micellar Water
2. **Weekly Treatment** - Renewing SA Cleanser 2-3 times per week on chin area
3. **Acne Care** - Apply Effaclar Duo as directed

**CHIN-SPECIFIC TIPS:**
- Chin area is prone to hormonal breakouts
- Effaclar Duo helps prevent and treat blemishes
- Don't forget to cleanse under the jawline"
        ),
        _ => format!(
            "Here's your routine for {} area using the recommended products.",
            area.trim()
        ),
    }
}
