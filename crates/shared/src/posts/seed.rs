use super::model::BlogPost;
use super::slug::slugify;

/// Built-in articles shipped with the site.
pub fn seed_posts() -> Vec<BlogPost> {
    [
        (
            "seed-self-custody",
            "Why Self-Custody is Crucial!!",
            "Not your keys, not your coins: what holding your own keys really means.",
            "When you leave funds on an exchange you hold an IOU, not the asset itself. \
             A self-custody wallet gives you the private keys, and with them full control and \
             full responsibility. This article walks through the trade-offs, the failure modes \
             of custodial platforms, and a simple checklist for moving funds safely.",
            "https://images.unsplash.com/photo-1621761191319-c6fb62004040?w=1200",
            "2024-05-20T09:00:00.000Z",
        ),
        (
            "seed-seed-phrases",
            "Seed Phrases Explained",
            "Twelve or twenty-four words stand between you and your savings.",
            "A seed phrase encodes the master secret your wallet uses to derive every key. \
             Anyone who sees it can take your funds, and if you lose it nobody can recover them. \
             Learn how to write it down, where to store it, and which 'helpful' requests for it \
             are always scams.",
            "https://images.unsplash.com/photo-1639762681485-074b7f938ba0?w=1200",
            "2024-04-02T14:30:00.000Z",
        ),
        (
            "seed-phishing",
            "Five Phishing Tricks Aimed at Crypto Holders",
            "Fake support agents, cloned sites and poisoned addresses, and how to spot them.",
            "Attackers rarely break cryptography; they break people. We cover impersonated \
             support chats, look-alike domains, malicious token approvals, address poisoning \
             and urgent 'security alerts', with a habit you can adopt for each one.",
            "https://images.unsplash.com/photo-1563986768609-322da13575f3?w=1200",
            "2024-03-11T08:15:00.000Z",
        ),
    ]
    .into_iter()
    .map(
        |(id, title, summary, content, image_url, published_at)| BlogPost {
            id: id.to_string(),
            slug: slugify(title),
            title: title.to_string(),
            summary: summary.to_string(),
            content: content.to_string(),
            image_url: image_url.to_string(),
            published_at: published_at.to_string(),
        },
    )
    .collect()
}

#[cfg(test)]
mod tests {
    use super::seed_posts;

    #[test]
    fn seed_posts_have_parseable_timestamps_and_slugs() {
        for post in seed_posts() {
            assert!(post.published_at_utc().is_some(), "{}", post.id);
            assert!(!post.slug.is_empty(), "{}", post.id);
        }
    }
}
