//! Initial migration creating the mirrored provider schema.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        self.create_accounts(manager).await?;
        self.create_repositories(manager).await?;
        self.create_issues(manager).await?;
        self.create_reviews(manager).await?;
        self.create_links(manager).await?;
        self.create_teams(manager).await?;
        self.create_bookkeeping(manager).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let tables = [
            Alias::new("sync_metadata"),
            Alias::new("contribution_events"),
            Alias::new("team_memberships"),
            Alias::new("teams"),
            Alias::new("issue_links"),
            Alias::new("pull_request_review_comments"),
            Alias::new("pull_request_review_threads"),
            Alias::new("pull_request_reviews"),
            Alias::new("issue_assignees"),
            Alias::new("issue_labels"),
            Alias::new("pull_requests"),
            Alias::new("issues"),
            Alias::new("issue_types"),
            Alias::new("milestones"),
            Alias::new("labels"),
            Alias::new("repositories"),
            Alias::new("organizations"),
            Alias::new("users"),
        ];
        for table in tables {
            manager
                .drop_table(Table::drop().table(table).if_exists().to_owned())
                .await?;
        }
        Ok(())
    }
}

impl Migration {
    async fn create_accounts(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Login).string().not_null())
                    .col(ColumnDef::new(Users::Name).string().null())
                    .col(ColumnDef::new(Users::Email).string().null())
                    .col(ColumnDef::new(Users::AvatarUrl).text().null())
                    .col(ColumnDef::new(Users::HtmlUrl).text().null())
                    .col(ColumnDef::new(Users::UserType).string().null())
                    .col(synced_at(Users::SyncedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_users_login")
                    .table(Users::Table)
                    .col(Users::Login)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Organizations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Organizations::Id)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Organizations::Login).string().not_null())
                    .col(ColumnDef::new(Organizations::Name).string().null())
                    .col(ColumnDef::new(Organizations::AvatarUrl).text().null())
                    .col(ColumnDef::new(Organizations::HtmlUrl).text().null())
                    .col(synced_at(Organizations::SyncedAt))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn create_repositories(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Repositories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Repositories::Id)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Repositories::OrganizationId)
                            .big_integer()
                            .null(),
                    )
                    .col(ColumnDef::new(Repositories::OwnerLogin).string().not_null())
                    .col(ColumnDef::new(Repositories::Name).string().not_null())
                    .col(ColumnDef::new(Repositories::FullName).string().not_null())
                    .col(ColumnDef::new(Repositories::Description).text().null())
                    .col(
                        ColumnDef::new(Repositories::DefaultBranch)
                            .string()
                            .not_null()
                            .default("main"),
                    )
                    .col(ColumnDef::new(Repositories::HtmlUrl).text().null())
                    .col(
                        ColumnDef::new(Repositories::Visibility)
                            .string()
                            .not_null()
                            .default("public"),
                    )
                    .col(
                        ColumnDef::new(Repositories::IsArchived)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(synced_at(Repositories::SyncedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_repositories_organization")
                            .from(Repositories::Table, Repositories::OrganizationId)
                            .to(Organizations::Table, Organizations::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_repositories_full_name")
                    .table(Repositories::Table)
                    .col(Repositories::FullName)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Labels::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Labels::Id)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Labels::RepositoryId).big_integer().not_null())
                    .col(ColumnDef::new(Labels::Name).string().not_null())
                    .col(ColumnDef::new(Labels::Color).string().null())
                    .col(ColumnDef::new(Labels::Description).text().null())
                    .col(synced_at(Labels::SyncedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_labels_repository")
                            .from(Labels::Table, Labels::RepositoryId)
                            .to(Repositories::Table, Repositories::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_labels_repository_name")
                    .table(Labels::Table)
                    .col(Labels::RepositoryId)
                    .col(Labels::Name)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Milestones::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Milestones::Id)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Milestones::RepositoryId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Milestones::Number).integer().not_null())
                    .col(ColumnDef::new(Milestones::Title).string().not_null())
                    .col(ColumnDef::new(Milestones::Description).text().null())
                    .col(ColumnDef::new(Milestones::State).string().not_null())
                    .col(
                        ColumnDef::new(Milestones::DueOn)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(synced_at(Milestones::SyncedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_milestones_repository")
                            .from(Milestones::Table, Milestones::RepositoryId)
                            .to(Repositories::Table, Repositories::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(IssueTypes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(IssueTypes::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(IssueTypes::OrganizationId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(IssueTypes::Name).string().not_null())
                    .col(ColumnDef::new(IssueTypes::Description).text().null())
                    .col(ColumnDef::new(IssueTypes::Color).string().null())
                    .col(
                        ColumnDef::new(IssueTypes::IsEnabled)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(synced_at(IssueTypes::SyncedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_issue_types_organization")
                            .from(IssueTypes::Table, IssueTypes::OrganizationId)
                            .to(Organizations::Table, Organizations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn create_issues(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Issues::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Issues::Id)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Issues::RepositoryId).big_integer().not_null())
                    .col(ColumnDef::new(Issues::Number).integer().not_null())
                    // Content
                    .col(ColumnDef::new(Issues::Title).string().not_null())
                    .col(ColumnDef::new(Issues::Body).text().null())
                    .col(ColumnDef::new(Issues::HtmlUrl).text().null())
                    // State
                    .col(ColumnDef::new(Issues::State).string().not_null())
                    .col(ColumnDef::new(Issues::StateReason).string().null())
                    .col(
                        ColumnDef::new(Issues::IsLocked)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Issues::CommentsCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    // References
                    .col(ColumnDef::new(Issues::AuthorId).big_integer().null())
                    .col(ColumnDef::new(Issues::MilestoneId).big_integer().null())
                    .col(ColumnDef::new(Issues::IssueTypeId).string().null())
                    // Sub-issue aggregates
                    .col(
                        ColumnDef::new(Issues::SubIssuesTotal)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Issues::SubIssuesCompleted)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Issues::SubIssuesPercentCompleted)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    // Timestamps
                    .col(
                        ColumnDef::new(Issues::CreatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Issues::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Issues::ClosedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(synced_at(Issues::SyncedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_issues_repository")
                            .from(Issues::Table, Issues::RepositoryId)
                            .to(Repositories::Table, Repositories::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_issues_repository_number")
                    .table(Issues::Table)
                    .col(Issues::RepositoryId)
                    .col(Issues::Number)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PullRequests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PullRequests::IssueId)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PullRequests::IsDraft)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(PullRequests::IsMerged)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(PullRequests::MergedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(PullRequests::MergedById).big_integer().null())
                    .col(ColumnDef::new(PullRequests::HeadRef).string().null())
                    .col(ColumnDef::new(PullRequests::BaseRef).string().null())
                    .col(ColumnDef::new(PullRequests::HeadSha).string().null())
                    .col(ColumnDef::new(PullRequests::Additions).integer().null())
                    .col(ColumnDef::new(PullRequests::Deletions).integer().null())
                    .col(ColumnDef::new(PullRequests::ChangedFiles).integer().null())
                    .col(ColumnDef::new(PullRequests::Commits).integer().null())
                    .col(synced_at(PullRequests::SyncedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_pull_requests_issue")
                            .from(PullRequests::Table, PullRequests::IssueId)
                            .to(Issues::Table, Issues::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(IssueLabels::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(IssueLabels::IssueId).big_integer().not_null())
                    .col(ColumnDef::new(IssueLabels::LabelId).big_integer().not_null())
                    .primary_key(
                        Index::create()
                            .col(IssueLabels::IssueId)
                            .col(IssueLabels::LabelId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_issue_labels_issue")
                            .from(IssueLabels::Table, IssueLabels::IssueId)
                            .to(Issues::Table, Issues::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_issue_labels_label")
                            .from(IssueLabels::Table, IssueLabels::LabelId)
                            .to(Labels::Table, Labels::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(IssueAssignees::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(IssueAssignees::IssueId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(IssueAssignees::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(IssueAssignees::IssueId)
                            .col(IssueAssignees::UserId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_issue_assignees_issue")
                            .from(IssueAssignees::Table, IssueAssignees::IssueId)
                            .to(Issues::Table, Issues::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_issue_assignees_user")
                            .from(IssueAssignees::Table, IssueAssignees::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn create_reviews(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PullRequestReviews::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PullRequestReviews::Id)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PullRequestReviews::PullRequestId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PullRequestReviews::AuthorId)
                            .big_integer()
                            .null(),
                    )
                    .col(ColumnDef::new(PullRequestReviews::State).string().not_null())
                    .col(ColumnDef::new(PullRequestReviews::Body).text().null())
                    .col(
                        ColumnDef::new(PullRequestReviews::SubmittedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(PullRequestReviews::CommitId).string().null())
                    .col(ColumnDef::new(PullRequestReviews::HtmlUrl).text().null())
                    .col(
                        ColumnDef::new(PullRequestReviews::IsDismissed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(synced_at(PullRequestReviews::SyncedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reviews_pull_request")
                            .from(PullRequestReviews::Table, PullRequestReviews::PullRequestId)
                            .to(PullRequests::Table, PullRequests::IssueId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PullRequestReviewThreads::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PullRequestReviewThreads::Id)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PullRequestReviewThreads::PullRequestId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PullRequestReviewThreads::State)
                            .string()
                            .not_null()
                            .default("unresolved"),
                    )
                    .col(
                        ColumnDef::new(PullRequestReviewThreads::ResolvedById)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PullRequestReviewThreads::ResolvedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(PullRequestReviewThreads::Path).text().null())
                    .col(
                        ColumnDef::new(PullRequestReviewThreads::Line)
                            .integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PullRequestReviewThreads::NodeId)
                            .string()
                            .null(),
                    )
                    .col(synced_at(PullRequestReviewThreads::SyncedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_threads_pull_request")
                            .from(
                                PullRequestReviewThreads::Table,
                                PullRequestReviewThreads::PullRequestId,
                            )
                            .to(PullRequests::Table, PullRequests::IssueId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PullRequestReviewComments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PullRequestReviewComments::Id)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PullRequestReviewComments::PullRequestId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PullRequestReviewComments::ReviewId)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PullRequestReviewComments::ThreadId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PullRequestReviewComments::InReplyToId)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PullRequestReviewComments::AuthorId)
                            .big_integer()
                            .null(),
                    )
                    // Content
                    .col(
                        ColumnDef::new(PullRequestReviewComments::Body)
                            .text()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PullRequestReviewComments::HtmlUrl).text().null())
                    // Diff position
                    .col(ColumnDef::new(PullRequestReviewComments::Path).text().not_null())
                    .col(ColumnDef::new(PullRequestReviewComments::Line).integer().null())
                    .col(
                        ColumnDef::new(PullRequestReviewComments::OriginalLine)
                            .integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PullRequestReviewComments::StartLine)
                            .integer()
                            .null(),
                    )
                    .col(ColumnDef::new(PullRequestReviewComments::Side).string().null())
                    .col(
                        ColumnDef::new(PullRequestReviewComments::CommitId)
                            .string()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PullRequestReviewComments::DiffHunk)
                            .text()
                            .null(),
                    )
                    // Timestamps
                    .col(
                        ColumnDef::new(PullRequestReviewComments::CreatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PullRequestReviewComments::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(synced_at(PullRequestReviewComments::SyncedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_review_comments_pull_request")
                            .from(
                                PullRequestReviewComments::Table,
                                PullRequestReviewComments::PullRequestId,
                            )
                            .to(PullRequests::Table, PullRequests::IssueId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_review_comments_thread")
                            .from(
                                PullRequestReviewComments::Table,
                                PullRequestReviewComments::ThreadId,
                            )
                            .to(
                                PullRequestReviewThreads::Table,
                                PullRequestReviewThreads::Id,
                            )
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_review_comments_thread")
                    .table(PullRequestReviewComments::Table)
                    .col(PullRequestReviewComments::ThreadId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn create_links(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(IssueLinks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(IssueLinks::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(IssueLinks::SourceIssueId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(IssueLinks::TargetIssueId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(IssueLinks::LinkType).string().not_null())
                    .col(
                        ColumnDef::new(IssueLinks::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_issue_links_source")
                            .from(IssueLinks::Table, IssueLinks::SourceIssueId)
                            .to(Issues::Table, Issues::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_issue_links_target")
                            .from(IssueLinks::Table, IssueLinks::TargetIssueId)
                            .to(Issues::Table, Issues::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One edge per (source, target, type)
        manager
            .create_index(
                Index::create()
                    .name("idx_issue_links_edge")
                    .table(IssueLinks::Table)
                    .col(IssueLinks::SourceIssueId)
                    .col(IssueLinks::TargetIssueId)
                    .col(IssueLinks::LinkType)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn create_teams(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Teams::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Teams::Id)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Teams::OrganizationId).big_integer().not_null())
                    .col(ColumnDef::new(Teams::Name).string().not_null())
                    .col(ColumnDef::new(Teams::Slug).string().not_null())
                    .col(ColumnDef::new(Teams::Description).text().null())
                    .col(ColumnDef::new(Teams::Privacy).string().null())
                    .col(ColumnDef::new(Teams::ParentTeamId).big_integer().null())
                    .col(ColumnDef::new(Teams::HtmlUrl).text().null())
                    .col(synced_at(Teams::SyncedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_teams_organization")
                            .from(Teams::Table, Teams::OrganizationId)
                            .to(Organizations::Table, Organizations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TeamMemberships::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TeamMemberships::TeamId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TeamMemberships::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TeamMemberships::Role)
                            .string()
                            .not_null()
                            .default("member"),
                    )
                    .primary_key(
                        Index::create()
                            .col(TeamMemberships::TeamId)
                            .col(TeamMemberships::UserId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_team_memberships_team")
                            .from(TeamMemberships::Table, TeamMemberships::TeamId)
                            .to(Teams::Table, Teams::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_team_memberships_user")
                            .from(TeamMemberships::Table, TeamMemberships::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn create_bookkeeping(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ContributionEvents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ContributionEvents::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ContributionEvents::SourceType)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ContributionEvents::SourceId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ContributionEvents::ActorId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ContributionEvents::RepositoryId)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ContributionEvents::OccurredAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ContributionEvents::RecordedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_contribution_events_source")
                    .table(ContributionEvents::Table)
                    .col(ContributionEvents::SourceType)
                    .col(ContributionEvents::SourceId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SyncMetadata::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SyncMetadata::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SyncMetadata::TenantId).big_integer().not_null())
                    .col(ColumnDef::new(SyncMetadata::SyncType).string().not_null())
                    .col(
                        ColumnDef::new(SyncMetadata::LastSyncedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_sync_metadata_tenant_type")
                    .table(SyncMetadata::Table)
                    .col(SyncMetadata::TenantId)
                    .col(SyncMetadata::SyncType)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}

fn synced_at<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .timestamp_with_time_zone()
        .not_null()
        .default(Expr::current_timestamp())
        .to_owned()
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Login,
    Name,
    Email,
    AvatarUrl,
    HtmlUrl,
    UserType,
    SyncedAt,
}

#[derive(DeriveIden)]
enum Organizations {
    Table,
    Id,
    Login,
    Name,
    AvatarUrl,
    HtmlUrl,
    SyncedAt,
}

#[derive(DeriveIden)]
enum Repositories {
    Table,
    Id,
    OrganizationId,
    OwnerLogin,
    Name,
    FullName,
    Description,
    DefaultBranch,
    HtmlUrl,
    Visibility,
    IsArchived,
    SyncedAt,
}

#[derive(DeriveIden)]
enum Labels {
    Table,
    Id,
    RepositoryId,
    Name,
    Color,
    Description,
    SyncedAt,
}

#[derive(DeriveIden)]
enum Milestones {
    Table,
    Id,
    RepositoryId,
    Number,
    Title,
    Description,
    State,
    DueOn,
    SyncedAt,
}

#[derive(DeriveIden)]
enum IssueTypes {
    Table,
    Id,
    OrganizationId,
    Name,
    Description,
    Color,
    IsEnabled,
    SyncedAt,
}

#[derive(DeriveIden)]
enum Issues {
    Table,
    Id,
    RepositoryId,
    Number,
    Title,
    Body,
    HtmlUrl,
    State,
    StateReason,
    IsLocked,
    CommentsCount,
    AuthorId,
    MilestoneId,
    IssueTypeId,
    SubIssuesTotal,
    SubIssuesCompleted,
    SubIssuesPercentCompleted,
    CreatedAt,
    UpdatedAt,
    ClosedAt,
    SyncedAt,
}

#[derive(DeriveIden)]
enum PullRequests {
    Table,
    IssueId,
    IsDraft,
    IsMerged,
    MergedAt,
    MergedById,
    HeadRef,
    BaseRef,
    HeadSha,
    Additions,
    Deletions,
    ChangedFiles,
    Commits,
    SyncedAt,
}

#[derive(DeriveIden)]
enum IssueLabels {
    Table,
    IssueId,
    LabelId,
}

#[derive(DeriveIden)]
enum IssueAssignees {
    Table,
    IssueId,
    UserId,
}

#[derive(DeriveIden)]
enum PullRequestReviews {
    Table,
    Id,
    PullRequestId,
    AuthorId,
    State,
    Body,
    SubmittedAt,
    CommitId,
    HtmlUrl,
    IsDismissed,
    SyncedAt,
}

#[derive(DeriveIden)]
enum PullRequestReviewThreads {
    Table,
    Id,
    PullRequestId,
    State,
    ResolvedById,
    ResolvedAt,
    Path,
    Line,
    NodeId,
    SyncedAt,
}

#[derive(DeriveIden)]
enum PullRequestReviewComments {
    Table,
    Id,
    PullRequestId,
    ReviewId,
    ThreadId,
    InReplyToId,
    AuthorId,
    Body,
    HtmlUrl,
    Path,
    Line,
    OriginalLine,
    StartLine,
    Side,
    CommitId,
    DiffHunk,
    CreatedAt,
    UpdatedAt,
    SyncedAt,
}

#[derive(DeriveIden)]
enum IssueLinks {
    Table,
    Id,
    SourceIssueId,
    TargetIssueId,
    LinkType,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Teams {
    Table,
    Id,
    OrganizationId,
    Name,
    Slug,
    Description,
    Privacy,
    ParentTeamId,
    HtmlUrl,
    SyncedAt,
}

#[derive(DeriveIden)]
enum TeamMemberships {
    Table,
    TeamId,
    UserId,
    Role,
}

#[derive(DeriveIden)]
enum ContributionEvents {
    Table,
    Id,
    SourceType,
    SourceId,
    ActorId,
    RepositoryId,
    OccurredAt,
    RecordedAt,
}

#[derive(DeriveIden)]
#[sea_orm(iden = "sync_metadata")]
enum SyncMetadata {
    Table,
    Id,
    TenantId,
    SyncType,
    LastSyncedAt,
}
