//! Prompt assembly for the influencer assessment.

use reelscout_core::ScrapeResult;
use serde_json::{json, Value};

const INSTRUCTIONS: &str = "\
You are assessing an Instagram creator for brand collaborations. Use the \
profile data and recent posts below, plus anything you know about the \
creator from public sources (press coverage, past sponsorships, \
controversies), to judge whether they are a good fit for sponsorships.";

const METHOD: &str = "\
## 2. Engagement and content
- Estimate the engagement rate (%) and the likes-to-comments ratio.
- Look at comment patterns: spam, authenticity, audience sentiment.
- Judge caption quality, storytelling, posting frequency and consistency.

## 3. Audience and brand fit
- Estimate age groups (13-17, 18-24, 25-34, 35+), gender split and the top countries.
- Score brand suitability from 1 to 10: value alignment, similar past partners, negative PR.

## 4. Ratings (1-10)
- Profile: bio completeness, profile image quality, link credibility.
- Engagement: average rate and daily trend.
- Content: caption effectiveness, visual consistency, category alignment.
- Authenticity: fake engagement, comment authenticity, growth trends.
- Public perception: brand deals, media coverage, presence beyond Instagram.

## 5. Risks
- Suspicious follower growth, bot or spam comments, controversies, reactions to criticism.";

/// Build the full prompt for one scrape.
///
/// Profile fields are embedded verbatim; posts are embedded as pretty JSON in
/// their wire format. The reply must follow [`output_skeleton`].
#[must_use]
pub fn build_prompt(data: &ScrapeResult) -> String {
    let profile = &data.user_info;
    let links = serde_json::to_string(&profile.links).unwrap_or_else(|_| "[]".to_string());
    let reels = serde_json::to_string_pretty(&data.reels).unwrap_or_else(|_| "[]".to_string());
    let skeleton =
        serde_json::to_string_pretty(&output_skeleton(data)).unwrap_or_else(|_| "{}".to_string());

    format!(
        "{INSTRUCTIONS}\n\n\
         ## 1. Profile\n\
         - Username: {username}\n\
         - Name: {name}\n\
         - Bio: {bio}\n\
         - Profile picture: {picture}\n\
         - Links: {links}\n\
         - Posts analysed: {count}\n\
         - Recent posts:\n{reels}\n\n\
         {METHOD}\n\n\
         ## 6. Output\n\
         Reply with JSON only, using exactly this shape:\n{skeleton}\n",
        username = profile.username,
        name = profile.name,
        bio = profile.bio_text,
        picture = profile.profile_image,
        count = data.reels.len(),
    )
}

/// The JSON shape the dashboard reads. Placeholder strings show the expected
/// format of each value.
#[must_use]
pub fn output_skeleton(data: &ScrapeResult) -> Value {
    let profile = &data.user_info;
    json!({
        "profileInfo": {
            "username": profile.username,
            "name": profile.name,
            "profilePic": profile.profile_image,
            "bio": profile.bio_text,
            "completeness": { "score": "X/10", "percentage": "XX%" }
        },
        "ratings": {
            "profile": { "score": "X/10", "bio": "X/10", "imageQuality": "X/10", "linkCredibility": "X/10" },
            "engagement": { "score": "X/10", "percentage": "XX%", "dailyTrend": "±XX%" },
            "content": { "score": "X/10", "consistency": "XX%", "categoryAlignment": "XX%" },
            "authenticity": { "score": "X/10", "riskPercentage": "XX%" },
            "publicPerception": { "score": "X/10", "sources": ["source"], "mentions": ["mention"] },
            "brandSuitability": { "score": "X/10", "alignment": "XX%", "pastCollaborations": ["brand"] }
        },
        "categoryClassification": {
            "primary": { "name": "category", "percentage": "XX%" },
            "secondary": [{ "name": "category", "percentage": "XX%" }]
        },
        "audienceDemographics": {
            "ageGroups": { "13-17": "XX%", "18-24": "XX%", "25-34": "XX%", "35+": "XX%" },
            "genderDistribution": { "male": "XX%", "female": "XX%", "other": "XX%" },
            "topLocations": [{ "country": "Country", "percentage": "XX%" }]
        },
        "reelsAnalysis": [{
            "thumbnail": "url",
            "caption": "text",
            "engagement": { "rawLikes": 0, "rawComments": 0, "ratePercentage": "XX%", "score": "X/10" },
            "timing": { "postDate": "YYYY-MM-DD", "peakHour": "HH:MM" }
        }],
        "visualizationData": {
            "engagementTrend": { "dates": ["YYYY-MM-DD"], "rates": ["XX%"] },
            "performanceMatrix": {
                "bestPost": { "engagementRate": "XX%", "score": "X/10" },
                "worstPost": { "engagementRate": "XX%", "score": "X/10" }
            }
        },
        "riskFactors": {
            "redFlags": ["flag"],
            "anomalies": ["anomaly"],
            "controversies": ["controversy"]
        },
        "overallAssessment": {
            "credibilityScore": "X/10",
            "brandSuitabilityScore": "X/10",
            "recommendation": "final recommendation",
            "strengths": ["strength"],
            "concerns": ["concern"]
        }
    })
}
